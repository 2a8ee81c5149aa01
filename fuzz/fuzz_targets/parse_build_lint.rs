#![no_main]

use hbml::{LintOptions, tree_builder};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(source) = std::str::from_utf8(data) else {
        return;
    };

    match hbml::parse(source, "fuzz.hbml") {
        Ok(nodes) => {
            let _ = hbml::to_html(&nodes);
            let json = tree_builder::serialize_tree(&nodes, source);
            serde_json::from_str::<serde_json::Value>(&json).expect("tree output must be valid JSON");
        }
        Err(e) => {
            let json = tree_builder::serialize_error(&e, source);
            serde_json::from_str::<serde_json::Value>(&json).expect("error output must be valid JSON");
        }
    }

    if let Ok(nodes) = hbml::parse_for_lint(source, "fuzz.hbml") {
        let _ = hbml::lint(&nodes, &LintOptions::default());
    }
});
