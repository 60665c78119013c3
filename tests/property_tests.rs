//! Property tests for scope dispatch and attribute write counts.

use std::collections::BTreeMap;

use assign_attributes::{
    AssignAttributesPolicy, AssignAttributesPolicyConfiguration, Attribute, ExecutionContext,
    PolicyChain, PolicyScope, ReadWriteStream, Request, Response, Result,
};
use proptest::prelude::*;
use serde_json::{json, Value};

/// Context whose engine echoes the expression text back and which counts writes.
#[derive(Default)]
struct CountingContext {
    writes: usize,
    attributes: BTreeMap<String, Value>,
}

impl ExecutionContext for CountingContext {
    fn get_value(&self, expression: &str) -> Result<Value> {
        Ok(json!(expression))
    }

    fn set_variable(&mut self, _: &str, _: Value) {}

    fn set_attribute(&mut self, name: &str, value: Value) {
        self.writes += 1;
        self.attributes.insert(name.to_string(), value);
    }

    fn get_attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }
}

#[derive(Default)]
struct Counter {
    continued: usize,
    ended: usize,
}

impl PolicyChain for Counter {
    fn do_next(&mut self, _: &Request, _: &Response) {
        self.continued += 1;
    }
}

impl ReadWriteStream for Counter {
    fn write(&mut self, _: &[u8]) {}

    fn end(&mut self) {
        self.ended += 1;
    }
}

fn scope_strategy() -> impl Strategy<Value = Option<PolicyScope>> {
    prop_oneof![
        Just(None),
        Just(Some(PolicyScope::Request)),
        Just(Some(PolicyScope::RequestContent)),
        Just(Some(PolicyScope::Response)),
        Just(Some(PolicyScope::ResponseContent)),
    ]
}

/// Runs all four hooks and records which of them wrote attributes.
fn run_all_hooks(policy: &AssignAttributesPolicy) -> ([usize; 4], Counter) {
    let request = Request::new("req", "GET", "/");
    let response = Response::new(200);
    let mut counter = Counter::default();
    let mut writes = [0; 4];

    let mut ctx = CountingContext::default();
    policy.on_request(&request, &response, &mut ctx, &mut counter);
    writes[0] = ctx.writes;

    let mut ctx = CountingContext::default();
    policy.on_request_content(&request, &mut ctx, &mut counter).end();
    writes[1] = ctx.writes;

    let mut ctx = CountingContext::default();
    policy.on_response(&request, &response, &mut ctx, &mut counter);
    writes[2] = ctx.writes;

    let mut ctx = CountingContext::default();
    policy.on_response_content(&response, &mut ctx, &mut counter).end();
    writes[3] = ctx.writes;

    (writes, counter)
}

proptest! {
    #[test]
    fn exactly_one_hook_assigns(scope in scope_strategy(), n in 1usize..6) {
        let attributes = (0..n).map(|i| Attribute::new(format!("k{i}"), format!("v{i}"))).collect();
        let policy = AssignAttributesPolicy::new(AssignAttributesPolicyConfiguration::new(scope, attributes));

        let (writes, counter) = run_all_hooks(&policy);

        let expected = match scope {
            None | Some(PolicyScope::Request) => 0,
            Some(PolicyScope::RequestContent) => 1,
            Some(PolicyScope::Response) => 2,
            Some(PolicyScope::ResponseContent) => 3,
        };
        for (hook, count) in writes.iter().enumerate() {
            prop_assert_eq!(*count, if hook == expected { n } else { 0 });
        }
        prop_assert_eq!(counter.continued, 2);
        prop_assert_eq!(counter.ended, 2);
    }

    #[test]
    fn only_named_attributes_are_written(names in proptest::collection::vec("[ a-z]{0,4}", 0..8)) {
        let attributes: Vec<Attribute> = names.iter().map(|n| Attribute::new(n.clone(), "v")).collect();
        let valid = names.iter().filter(|n| !n.trim().is_empty()).count();
        let policy = AssignAttributesPolicy::new(AssignAttributesPolicyConfiguration::new(None, attributes));

        let mut ctx = CountingContext::default();
        policy.on_request(&Request::new("req", "GET", "/"), &Response::new(200), &mut ctx, &mut Counter::default());

        prop_assert_eq!(ctx.writes, valid);
        prop_assert!(ctx.attributes.keys().all(|k| !k.trim().is_empty()));
    }
}
