use std::path::{Path, PathBuf};

use cf_project::{ProjectError, ValidationError, load_scenario, parse_yaml, reference_chain};

fn scenarios_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("scenarios")
}

#[test]
fn shipped_scenarios_load_and_validate() {
    for name in ["reference_chain.yaml", "single_route.json"] {
        let path = scenarios_dir().join(name);
        load_scenario(&path).unwrap_or_else(|e| panic!("Failed to load {}: {}", name, e));
    }
}

#[test]
fn yaml_reference_matches_builtin() {
    let loaded = load_scenario(&scenarios_dir().join("reference_chain.yaml")).unwrap();
    assert_eq!(loaded, reference_chain());
}

#[test]
fn edges_without_weight_stay_unset() {
    let loaded = load_scenario(&scenarios_dir().join("single_route.json")).unwrap();
    assert!(loaded.edges.iter().all(|e| e.weight.is_none() && e.id.is_none()));
}

#[test]
fn unknown_extension_is_rejected() {
    let err = load_scenario(Path::new("chain.toml")).unwrap_err();
    assert!(matches!(err, ProjectError::UnsupportedFormat { .. }));
}

#[test]
fn unknown_kind_fails_to_parse() {
    let yaml = "nodes:\n  - { id: a, kind: compressor }\n";
    assert!(matches!(parse_yaml(yaml), Err(ProjectError::Yaml(_))));
}

#[test]
fn illegal_route_in_file_is_reported() {
    let yaml = "\
nodes:
  - { id: s, kind: storage }
  - { id: t, kind: transport }
edges:
  - { source: s, target: t }
";
    assert!(matches!(
        parse_yaml(yaml),
        Err(ProjectError::Validation(ValidationError::IllegalRoute { .. }))
    ));
}
