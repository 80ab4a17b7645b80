use std::sync::Arc;

use proptest::prelude::*;
use vsk::analyzer::analyze;
use vsk::eval::condition::Condition;
use vsk::eval::context::ExecutionContext;
use vsk::eval::expression::evaluate_with_replacements;
use vsk::provider::plugins::host::in_memory::InMemorySession;
use vsk::provider::plugins::storage::in_memory::InMemoryStore;
use vsk::variable::VariableManager;

fn context(name: &str, args: &[String]) -> (ExecutionContext, Arc<VariableManager>) {
    let variables = Arc::new(VariableManager::new(Arc::new(InMemoryStore::new())));
    let ctx = ExecutionContext::new(&variables)
        .with_session(Arc::new(InMemorySession::new(name)))
        .with_arguments(&["a".to_string()], args);
    (ctx, variables)
}

fn script_line() -> impl Strategy<Value = String> {
    let indent = prop_oneof![Just(""), Just("    "), Just("\t"), Just("        "), Just("  ")];
    let body = prop_oneof![
        Just("command /cmd <a>:".to_string()),
        Just("on join:".to_string()),
        Just("trigger:".to_string()),
        Just("else:".to_string()),
        Just("aliases: x, /y".to_string()),
        "[a-z]{1,6}".prop_map(|n| format!("send \"{}\" to player", n)),
        "[a-z]{1,6}".prop_map(|n| format!("if {{_{}}} is set:", n)),
        "[a-z]{1,6}".prop_map(|n| format!("set {{{}}} to \"1\"", n)),
        "[ -~]{0,20}",
    ];
    (indent, body).prop_map(|(indent, body)| format!("{}{}", indent, body))
}

proptest! {
    #[test]
    fn parsing_is_deterministic(lines in prop::collection::vec(script_line(), 0..30)) {
        let source = lines.join("\n");
        prop_assert_eq!(analyze("p", &source), analyze("p", &source));
    }

    #[test]
    fn parsing_never_panics(source in "\\PC{0,200}") {
        let _ = analyze("fuzz", &source);
    }

    #[test]
    fn substitution_never_panics(text in "[%{}a-z_: ]{0,40}", arg in "[%{}a-z]{0,10}") {
        let (ctx, _variables) = context("Alice", &[arg]);
        let _ = evaluate_with_replacements(&text, &ctx);
    }

    #[test]
    fn player_placeholder_uses_current_session(name in "[A-Za-z0-9_]{1,16}") {
        let (ctx, _variables) = context(&name, &[]);
        prop_assert_eq!(
            evaluate_with_replacements("Hello %player%!", &ctx),
            format!("Hello {}!", name)
        );
    }

    #[test]
    fn numeric_comparison_fails_closed(
        left in "[b-e]{1,8}|(?i:inf|infinity|nan)|[+-](?i:inf|infinity)",
        right in -1000i64..1000,
    ) {
        let (ctx, _variables) = context("Alice", &[]);
        let condition = Condition::parse(&format!("\"{}\" > \"{}\"", left, right));
        prop_assert!(!condition.evaluate(&ctx));
    }

    #[test]
    fn numeric_comparison_orders_numbers(a in -1000i64..1000, b in -1000i64..1000) {
        let (ctx, _variables) = context("Alice", &[]);
        let condition = Condition::parse(&format!("\"{}\" > \"{}\"", a, b));
        prop_assert_eq!(condition.evaluate(&ctx), a > b);
    }
}
