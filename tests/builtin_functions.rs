use assign_attributes::{EvalError, ExecutionContext, GatewayContext, Request, Response};
use serde_json::{json, Value};

fn eval(expr: &str) -> Value {
    let request = Request::new("req-fn", "GET", "/search?tag=a&tag=b&tag=a&q=Rust")
        .with_header("Accept", "text/html")
        .with_header("Accept", "application/json");
    let response = Response::new(200);
    GatewayContext::new(&request, &response).get_value(expr).unwrap()
}

#[test]
fn test_case_and_trim() {
    assert_eq!(eval("{request.parameters['q'][0].upper()}"), json!("RUST"));
    assert_eq!(eval("{request.parameters['q'][0].lower()}"), json!("rust"));
    assert_eq!(eval("{'  padded '.trim()}"), json!("padded"));
}

#[test]
fn test_case_methods_leave_non_strings_alone() {
    assert_eq!(eval("{request.parameters['tag'].upper()}"), json!(["a", "b", "a"]));
    assert_eq!(eval("{request.headers['Accept'][0].upper()}"), json!("TEXT/HTML"));
}

#[test]
fn test_header_is_case_insensitive() {
    assert_eq!(eval("{request.header('ACCEPT')}"), json!("text/html"));
    assert_eq!(eval("{request.header('X-Nope')}"), Value::Null);
}

#[test]
fn test_json_of_literal() {
    assert_eq!(eval("{'[1,2,3]'.json()[2]}"), json!(3));
}

#[test]
fn test_removed_helpers_are_unknown() {
    let request = Request::new("req-fn", "GET", "/");
    let response = Response::new(200);
    let context = GatewayContext::new(&request, &response);
    for expr in ["{request.headers.first()}", "{request.method.or_default('x')}"] {
        assert!(matches!(context.get_value(expr), Err(EvalError::Runtime(_))), "{expr}");
    }
}
