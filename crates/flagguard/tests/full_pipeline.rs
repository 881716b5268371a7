//! End-to-end pipeline scenarios: configuration through report.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use flagguard::analysis::conflicts::ConflictDetector;
use flagguard::analysis::theory::{ConstraintEncoder, EncodeOptions};
use flagguard::model::ConflictSeverity;
use flagguard::parsers::{self, Dialect};
use flagguard::{Analyzer, AnalyzerOptions};

fn write(root: &Path, rel: &str, content: &str) -> PathBuf {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
}

fn assume(pairs: &[(&str, bool)]) -> BTreeMap<String, bool> {
    pairs.iter().map(|&(n, v)| (n.to_string(), v)).collect()
}

#[test]
fn disabled_prerequisite_creates_conflict() {
    let dir = tempfile::tempdir().unwrap();
    let config = write(
        dir.path(),
        "flags.json",
        r#"{"flags": [
            {"name": "parent", "enabled": false},
            {"name": "child", "enabled": true, "dependencies": ["parent"]}
        ]}"#,
    );
    let src = dir.path().join("src");
    fs::create_dir_all(&src).unwrap();

    let report = Analyzer::default().analyze(&config, &src).unwrap();
    // Exactly the minimal conflict set: the always-off parent and the child
    // it starves. Pairs extending either singleton are not restated.
    assert_eq!(report.conflicts.len(), 2);
    assert_eq!(report.conflicts[0].values, assume(&[("parent", true)]));
    assert_eq!(report.conflicts[1].values, assume(&[("child", true)]));

    // Ad-hoc state queries against the same configuration.
    let parsed = parsers::parse_file(&config).unwrap();
    let theory = ConstraintEncoder::default().encode(&parsed.flags);
    let detector = ConflictDetector::new(&theory);
    let pair = detector
        .check_state(&assume(&[("child", true), ("parent", false)]))
        .expect("child=true, parent=false must be impossible");
    assert_eq!(pair.severity, ConflictSeverity::High);
    assert!(detector.check_state(&assume(&[("child", true)])).is_some());
    assert!(detector.check_state(&assume(&[("child", false)])).is_none());
}

#[test]
fn dead_code_behind_always_off_flag() {
    let dir = tempfile::tempdir().unwrap();
    let config = write(
        dir.path(),
        "flags.json",
        r#"{"flags": [{"name": "f", "enabled": false}]}"#,
    );
    let src = dir.path().join("src");
    let mut app = String::new();
    for _ in 0..9 {
        app.push_str("print('filler')\n");
    }
    app.push_str("if is_enabled(\"f\"):\n    run_feature()\n");
    write(&src, "app.py", &app);

    let report = Analyzer::default().analyze(&config, &src).unwrap();
    assert_eq!(report.dead_regions.len(), 1);
    let region = &report.dead_regions[0];
    assert!(region.file.ends_with("app.py"));
    assert_eq!((region.start_line, region.end_line), (10, 10));
    assert!(region.reason.contains("'f'"));
    assert!(region.reason.contains("always disabled"));
}

#[test]
fn healthy_independent_flags() {
    let dir = tempfile::tempdir().unwrap();
    let config = write(
        dir.path(),
        "flags.json",
        r#"{"flags": [{"name": "a", "enabled": true}, {"name": "b", "enabled": true}]}"#,
    );
    let src = dir.path().join("src");
    fs::create_dir_all(&src).unwrap();

    let report = Analyzer::default().analyze(&config, &src).unwrap();
    assert!(report.conflicts.is_empty());
    assert!(report.dead_regions.is_empty());
    assert_eq!(report.dependency_graph.nodes.len(), 2);
    assert!(report.dependency_graph.edges.is_empty());
}

#[test]
fn mutual_exclusion_detected_by_sat() {
    let dir = tempfile::tempdir().unwrap();
    let config = write(
        dir.path(),
        "flags.json",
        r#"{"flags": [
            {"name": "premium", "enabled": true},
            {"name": "free_tier", "enabled": true}
        ]}"#,
    );
    let src = dir.path().join("src");
    fs::create_dir_all(&src).unwrap();

    let analyzer = Analyzer::new(AnalyzerOptions {
        exclusive_groups: vec![vec!["premium".to_string(), "free_tier".to_string()]],
        ..Default::default()
    });
    let report = analyzer.analyze(&config, &src).unwrap();
    assert_eq!(report.conflicts.len(), 1);
    let conflict = &report.conflicts[0];
    assert_eq!(
        conflict.values,
        assume(&[("premium", true), ("free_tier", true)])
    );
    assert_eq!(conflict.severity, ConflictSeverity::Critical);
}

#[test]
fn negated_check_against_always_on_flag() {
    let dir = tempfile::tempdir().unwrap();
    let config = write(
        dir.path(),
        "flags.json",
        r#"{"flags": [{"name": "g", "enabled": true}]}"#,
    );
    let src = dir.path().join("src");
    let mut module = String::new();
    for _ in 0..41 {
        module.push_str("x = 1\n");
    }
    module.push_str("if not is_enabled(\"g\"):\n    legacy_path()\n");
    write(&src, "mod.py", &module);

    let analyzer = Analyzer::new(AnalyzerOptions {
        required_flags: vec!["g".to_string()],
        ..Default::default()
    });
    let report = analyzer.analyze(&config, &src).unwrap();
    assert_eq!(report.dead_regions.len(), 1);
    let region = &report.dead_regions[0];
    assert!(region.file.ends_with("mod.py"));
    assert_eq!(region.start_line, 42);
    assert!(region.reason.contains("'g'"));
    assert!(region.reason.contains("always enabled"));
}

#[test]
fn nested_checks_aggregate_into_one_path() {
    let dir = tempfile::tempdir().unwrap();
    let config = write(
        dir.path(),
        "flags.json",
        r#"{"flags": [
            {"name": "a", "enabled": true},
            {"name": "b", "enabled": false}
        ]}"#,
    );
    let src = dir.path().join("src");
    write(
        &src,
        "combo.py",
        concat!(
            "def combo():\n",
            "    if is_enabled(\"a\"):\n",
            "        if is_enabled(\"b\"):\n",
            "            run_both()\n",
        ),
    );

    let report = Analyzer::default().analyze(&config, &src).unwrap();
    // The site on `b` is dead on its own, and the composite path requiring
    // both flags is dead as well.
    let composite = report
        .dead_regions
        .iter()
        .find(|r| r.required.len() == 2)
        .expect("expected a composite dead path");
    assert_eq!(composite.required, assume(&[("a", true), ("b", true)]));
    assert_eq!((composite.start_line, composite.end_line), (2, 3));
    assert!(report
        .dead_regions
        .iter()
        .any(|r| r.required == assume(&[("b", true)])));
}

#[test]
fn runs_are_deterministic_modulo_ids_and_timestamp() {
    let dir = tempfile::tempdir().unwrap();
    let config = write(
        dir.path(),
        "flags.json",
        r#"{"flags": [
            {"name": "parent", "enabled": false},
            {"name": "child", "enabled": true, "dependencies": ["parent"]}
        ]}"#,
    );
    let src = dir.path().join("src");
    write(&src, "a.py", "if is_enabled('child'):\n    pass\n");
    write(&src, "b.py", "if not is_enabled('parent'):\n    pass\n");

    let run = || Analyzer::default().analyze(&config, &src).unwrap();
    let left = run();
    let right = run();

    let strip = |report: flagguard::AnalysisReport| {
        let conflicts: Vec<_> = report
            .conflicts
            .into_iter()
            .map(|c| (c.flags, c.values, c.severity, c.reason, c.affected_locations))
            .collect();
        (
            conflicts,
            report.dead_regions,
            report.dependency_graph,
            report.cycles,
            report.files_scanned,
            report.flags_analyzed,
        )
    };
    assert_eq!(strip(left), strip(right));
}

#[test]
fn parse_round_trips_through_generic_dialect() {
    let launchdarkly = r#"{"flags": {
        "new_checkout": {
            "key": "new_checkout",
            "on": true,
            "variations": [true, false],
            "fallthrough": {"variation": 0},
            "prerequisites": [{"key": "payment_enabled"}],
            "tags": ["checkout"]
        },
        "payment_enabled": {
            "on": false,
            "variations": [true, false],
            "fallthrough": {"variation": 1}
        }
    }}"#;
    let unleash = concat!(
        "features:\n",
        "  - name: dark_mode\n",
        "    enabled: false\n",
        "  - name: banner\n",
        "    enabled: true\n",
        "    variants:\n",
        "      - name: blue\n",
        "        payload: {type: string, value: b}\n",
    );

    for (content, dialect) in [
        (launchdarkly, Dialect::LaunchDarkly),
        (unleash, Dialect::Unleash),
    ] {
        let first = parsers::parse_with_dialect(content, dialect).unwrap();
        assert!(first.issues.is_empty());

        let neutral = serde_json::to_string(&first.flags.to_value()).unwrap();
        let second = parsers::parse_with_dialect(&neutral, Dialect::Generic).unwrap();
        assert!(second.issues.is_empty());
        assert_eq!(first.flags.len(), second.flags.len());

        for flag in first.flags.iter() {
            let reparsed = second.flags.get(&flag.name).expect("flag survives round-trip");
            assert_eq!(flag.kind, reparsed.kind, "{}", flag.name);
            assert_eq!(flag.enabled, reparsed.enabled, "{}", flag.name);
            assert_eq!(flag.default_variation, reparsed.default_variation, "{}", flag.name);
            let names = |f: &flagguard::Flag| -> Vec<(String, serde_json::Value)> {
                f.variations
                    .iter()
                    .map(|v| (v.name.clone(), v.value.clone()))
                    .collect()
            };
            assert_eq!(names(flag), names(reparsed), "{}", flag.name);
            let deps = |f: &flagguard::Flag| -> std::collections::BTreeSet<String> {
                f.dependencies.iter().cloned().collect()
            };
            assert_eq!(deps(flag), deps(reparsed), "{}", flag.name);
        }
    }
}

#[test]
fn unresolved_dependency_is_surfaced_not_dropped() {
    let dir = tempfile::tempdir().unwrap();
    let config = write(
        dir.path(),
        "flags.json",
        r#"{"flags": [{"name": "child", "enabled": true, "dependencies": ["ghost"]}]}"#,
    );
    let src = dir.path().join("src");
    fs::create_dir_all(&src).unwrap();

    let report = Analyzer::default().analyze(&config, &src).unwrap();
    assert_eq!(report.unresolved_dependencies.len(), 1);
    assert_eq!(report.unresolved_dependencies[0].dependency, "ghost");
    // The free variable keeps the implication live: neither singleton is
    // impossible on its own, so the pair itself is the minimal conflict.
    assert_eq!(report.conflicts.len(), 1);
    assert_eq!(
        report.conflicts[0].values,
        assume(&[("child", true), ("ghost", false)])
    );
}

#[test]
fn exclusive_groups_handle_mixed_dialects() {
    let dir = tempfile::tempdir().unwrap();
    let config = write(
        dir.path(),
        "flags.yaml",
        concat!(
            "features:\n",
            "  - name: premium\n",
            "    enabled: true\n",
            "  - name: free_tier\n",
            "    enabled: true\n",
        ),
    );
    let src = dir.path().join("src");
    fs::create_dir_all(&src).unwrap();

    let analyzer = Analyzer::new(AnalyzerOptions {
        exclusive_groups: vec![vec!["premium".to_string(), "free_tier".to_string()]],
        ..Default::default()
    });
    let report = analyzer.analyze(&config, &src).unwrap();
    assert_eq!(report.conflicts.len(), 1);
    assert_eq!(report.conflicts[0].severity, ConflictSeverity::Critical);
}

#[test]
fn cyclic_dependencies_reported_in_graph() {
    let dir = tempfile::tempdir().unwrap();
    let config = write(
        dir.path(),
        "flags.json",
        r#"{"flags": [
            {"name": "a", "enabled": true, "dependencies": ["b"]},
            {"name": "b", "enabled": true, "dependencies": ["a"]}
        ]}"#,
    );
    let src = dir.path().join("src");
    fs::create_dir_all(&src).unwrap();

    let report = Analyzer::default().analyze(&config, &src).unwrap();
    assert_eq!(report.cycles, vec![vec!["a".to_string(), "b".to_string()]]);
    // Cycles are reported, never raised: the run still completes and the
    // equivalence class stays satisfiable.
    assert!(!report
        .conflicts
        .iter()
        .any(|c| c.values == assume(&[("a", true), ("b", true)])));
}

#[test]
fn check_state_arity_three_needs_opt_in() {
    // A three-way exclusion is invisible at the default arity but the
    // ad-hoc query still proves it impossible.
    let dir = tempfile::tempdir().unwrap();
    let config = write(
        dir.path(),
        "flags.json",
        r#"{"flags": [
            {"name": "x", "enabled": true},
            {"name": "y", "enabled": true},
            {"name": "z", "enabled": true}
        ]}"#,
    );
    let parsed = parsers::parse_file(&config).unwrap();
    let encoder = ConstraintEncoder::new(EncodeOptions {
        // x and y and z cannot all hold: encode as one ternary clause.
        exclusive_groups: Vec::new(),
        required_flags: Vec::new(),
    });
    let mut theory = encoder.encode(&parsed.flags);
    theory
        .session
        .assert_clause(&[("x", false), ("y", false), ("z", false)]);

    let detector = ConflictDetector::new(&theory);
    assert!(detector.detect_all().is_empty());
    assert!(detector
        .check_state(&assume(&[("x", true), ("y", true), ("z", true)]))
        .is_some());

    let wide = ConflictDetector::with_arity(&theory, 3);
    let conflicts = wide.detect_all();
    assert_eq!(conflicts.len(), 1);
    assert_eq!(
        conflicts[0].values,
        assume(&[("x", true), ("y", true), ("z", true)])
    );
}
