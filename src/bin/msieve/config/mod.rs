mod rules;

pub use rules::build_rule_config;
