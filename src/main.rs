use assign_attributes::{
    AssignAttributesPolicy, AssignAttributesPolicyConfiguration, GatewayContext, PolicyChain,
    ReadWriteStream, Request, Response,
};
use clap::Parser;
use tracing::Level;

/// Runs the assign-attributes policy over one simulated request/response and
/// prints the resulting context attributes as JSON.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Policy configuration file (JSON: scope + attributes)
    #[arg(long)]
    config: std::path::PathBuf,
    /// Request method
    #[arg(long, default_value = "GET")]
    method: String,
    /// Request URI, path plus optional query string
    #[arg(long, default_value = "/")]
    uri: String,
    /// Request header as `Name: value` (repeatable)
    #[arg(short = 'H', long = "header")]
    headers: Vec<String>,
    /// Request body
    #[arg(long)]
    body: Option<String>,
    /// Response status
    #[arg(long, default_value_t = 200)]
    status: u16,
    /// Response header as `Name: value` (repeatable)
    #[arg(long = "response-header")]
    response_headers: Vec<String>,
    /// Response body
    #[arg(long)]
    response_body: Option<String>,
    /// Log policy decisions to stderr
    #[arg(short, long)]
    verbose: bool,
}

struct Continue;

impl PolicyChain for Continue {
    fn do_next(&mut self, _: &Request, _: &Response) {}
}

/// Downstream body sink; bodies are not echoed.
struct Discard;

impl ReadWriteStream for Discard {
    fn write(&mut self, _: &[u8]) {}
    fn end(&mut self) {}
}

fn split_header(raw: &str) -> Result<(&str, &str), String> {
    raw.split_once(':')
        .map(|(n, v)| (n.trim(), v.trim()))
        .filter(|(n, _)| !n.is_empty())
        .ok_or_else(|| format!("Invalid header '{raw}', expected 'Name: value'"))
}

fn fail(msg: impl std::fmt::Display) -> ! {
    eprintln!("{msg}");
    std::process::exit(1);
}

fn main() {
    // Parse CLI arguments.
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::WARN })
        .init();

    let configuration = AssignAttributesPolicyConfiguration::from_path(&args.config)
        .unwrap_or_else(|e| fail(e));
    let policy = AssignAttributesPolicy::new(configuration);

    // Build the simulated exchange.
    let mut request = Request::new("cli-request", &args.method, &args.uri);
    for raw in &args.headers {
        let (name, value) = split_header(raw).unwrap_or_else(|e| fail(e));
        request.headers_mut().add(name, value);
    }
    let mut response = Response::new(args.status);
    for raw in &args.response_headers {
        let (name, value) = split_header(raw).unwrap_or_else(|e| fail(e));
        response.headers_mut().add(name, value);
    }

    let mut context = GatewayContext::new(&request, &response);
    let mut sink = Discard;

    // Walk the four phases in gateway order.
    policy.on_request(&request, &response, &mut context, &mut Continue);
    {
        let mut stream = policy.on_request_content(&request, &mut context, &mut sink);
        if let Some(body) = &args.body {
            stream.write(body.as_bytes());
        }
        stream.end();
    }
    policy.on_response(&request, &response, &mut context, &mut Continue);
    {
        let mut stream = policy.on_response_content(&response, &mut context, &mut sink);
        if let Some(body) = &args.response_body {
            stream.write(body.as_bytes());
        }
        stream.end();
    }

    let attributes = context.into_attributes();
    match serde_json::to_string_pretty(&attributes) {
        Ok(out) => println!("{out}"),
        Err(e) => fail(e),
    }
}
