use rollcall::{
    aggregate, restore, snapshot, Group, Host, IntermediateInventory, InventoryError, MergePolicy,
    Resolver, Source, Value, Vars,
};

fn document(name: &str, json: &str) -> Source {
    Source::json(name, json).expect("test document must be valid JSON")
}

fn resolve(sources: &[Source], policy: MergePolicy) -> rollcall::Inventory {
    Resolver::new()
        .with_policy(policy)
        .resolve(sources)
        .expect("resolution must succeed")
}

#[test]
fn precedence_defaults_group_host() {
    let with_host_override = document(
        "s1",
        r#"{"all": {
            "vars": {"a": 1},
            "children": {"g": {"vars": {"a": 2}, "hosts": {"h": {"a": 3}}}}
        }}"#,
    );
    let inv = resolve(&[with_host_override], MergePolicy::Replace);
    assert_eq!(inv.effective_vars("h").unwrap()["a"], Value::Int(3));

    let without_host_override = document(
        "s2",
        r#"{"all": {
            "vars": {"a": 1},
            "children": {"g": {"vars": {"a": 2}, "hosts": {"h": null}}}
        }}"#,
    );
    let inv = resolve(&[without_host_override], MergePolicy::Replace);
    assert_eq!(inv.effective_vars("h").unwrap()["a"], Value::Int(2));

    let defaults_only = document(
        "s3",
        r#"{"all": {
            "vars": {"a": 1},
            "children": {"g": {"hosts": {"h": null}}}
        }}"#,
    );
    let inv = resolve(&[defaults_only], MergePolicy::Replace);
    assert_eq!(inv.effective_vars("h").unwrap()["a"], Value::Int(1));
}

#[test]
fn multi_parent_later_parent_wins_at_equal_depth() {
    // Built directly so the declared parent order [a, b] is explicit.
    let mut ir = IntermediateInventory::new();

    let mut a = Group::new("a");
    a.set_var("x", Value::Int(1));
    a.set_var("y", Value::Int(1));
    let mut b = Group::new("b");
    b.set_var("x", Value::Int(2));
    b.set_var("z", Value::Int(2));
    let mut c = Group::new("c");
    c.push_parent("a");
    c.push_parent("b");

    for group in [a, b, c] {
        ir.groups.insert(group.name.clone(), group);
    }

    let mut host = Host::new("h");
    host.push_group("c");
    ir.hosts.insert("h".to_string(), host);

    let inv = aggregate(&[ir], MergePolicy::Replace).unwrap();
    let vars = inv.effective_vars("h").unwrap();
    assert_eq!(vars["x"], Value::Int(2));
    assert_eq!(vars["y"], Value::Int(1));
    assert_eq!(vars["z"], Value::Int(2));
}

#[test]
fn parent_cycle_fails_with_graph_error() {
    let cyclic = document(
        "cyclic",
        r#"{"all": {"children": {
            "a": {"children": {"b": {"hosts": {"h": null}}}},
            "b": {"children": {"a": null}}
        }}}"#,
    );

    let err = Resolver::new()
        .resolve(std::slice::from_ref(&cyclic))
        .unwrap_err();
    assert!(err.is_graph());
    let msg = format!("{err}");
    assert!(msg.contains("cycle"));
    assert!(msg.contains("'a'") || msg.contains("'b'"));
}

#[test]
fn two_sources_under_replace_take_the_later_scalar() {
    let s1 = document("s1", r#"{"all": {"hosts": {"h": {"k": "v1"}}}}"#);
    let s2 = document("s2", r#"{"all": {"hosts": {"h": {"k": "v2"}}}}"#);

    let inv = resolve(&[s1, s2], MergePolicy::Replace);
    assert_eq!(inv.effective_vars("h").unwrap()["k"], Value::from("v2"));
}

#[test]
fn two_sources_under_merge_union_nested_mappings() {
    let s1 = document(
        "s1",
        r#"{"all": {"hosts": {"h": {"k": {"from1": 1, "both": 1}}}}}"#,
    );
    let s2 = document(
        "s2",
        r#"{"all": {"hosts": {"h": {"k": {"from2": 2, "both": 2}}}}}"#,
    );

    let inv = resolve(&[s1, s2], MergePolicy::Merge);
    let k = inv.effective_vars("h").unwrap()["k"]
        .as_mapping()
        .unwrap()
        .clone();
    assert_eq!(k["from1"], Value::Int(1));
    assert_eq!(k["from2"], Value::Int(2));
    assert_eq!(k["both"], Value::Int(2));
}

#[test]
fn source_set_yielding_nothing_is_the_empty_inventory_error() {
    let vars_only = document("vars-only", r#"{"all": {"vars": {"k": 1}}}"#);

    let err = Resolver::new()
        .resolve(std::slice::from_ref(&vars_only))
        .unwrap_err();
    let InventoryError::NoValidInventory { sources } = err else {
        panic!("expected the empty-inventory error, got {err}");
    };
    assert_eq!(sources, vec!["vars-only".to_string()]);
}

#[test]
fn snapshot_roundtrip_preserves_declarations_and_effective() {
    let base = document(
        "base",
        r#"{"all": {
            "vars": {"domain": "lab.example", "retries": 3},
            "children": {
                "web": {"vars": {"tier": "frontend"},
                         "hosts": {"web1": {"rack": 4}, "web2": null}},
                "edge": {"children": {"web": null}}
            }
        }}"#,
    );
    let overlay = document(
        "overlay",
        r#"{"all": {"children": {"web": {"hosts": {"web1": {"rack": 7}}}}}}"#,
    );

    let inv = resolve(&[base, overlay], MergePolicy::Replace);
    assert_eq!(
        inv.effective_vars("web1").unwrap()["rack"],
        Value::Int(7)
    );

    let snap = snapshot(&inv);
    let json = rollcall::to_json_pretty(&snap).unwrap();
    let decoded = rollcall::from_json(&json).unwrap();
    let restored = restore(&decoded, MergePolicy::Replace).unwrap();

    assert_eq!(restored.hosts(), inv.hosts());
    assert_eq!(restored.groups(), inv.groups());
    assert_eq!(restored.defaults(), inv.defaults());
    for name in inv.hosts().keys() {
        assert_eq!(restored.effective_vars(name), inv.effective_vars(name));
    }
}

#[test]
fn structural_error_in_any_source_aborts_resolution() {
    let good = document("good", r#"{"all": {"hosts": {"h": null}}}"#);
    let bad = document("bad", r#"{"all": {"children": {"g": {"vars": [1]}}}}"#);

    let err = Resolver::new().resolve(&[good, bad]).unwrap_err();
    assert!(err.is_structural());
    assert!(format!("{err}").contains("bad"));
}

#[test]
fn group_vars_reach_hosts_through_deep_inheritance() {
    let deep = document(
        "deep",
        r#"{"all": {"children": {
            "site": {"vars": {"dns": "10.0.0.53", "site_only": true}},
            "rack": {"vars": {"dns": "10.0.1.53"}, "children": {
                "leaf": {"hosts": {"h": null}}
            }}
        }}}"#,
    );
    // "leaf" inherits from "rack" only; "site" stays unrelated.
    let inv = resolve(&[deep], MergePolicy::Replace);
    let vars = inv.effective_vars("h").unwrap();
    assert_eq!(vars["dns"], Value::from("10.0.1.53"));
    assert!(!vars.contains_key("site_only"));
}

#[test]
fn defaults_do_not_leak_into_declared_host_vars() {
    let src = document(
        "src",
        r#"{"all": {"vars": {"ambient": 1}, "hosts": {"h": {"own": 2}}}}"#,
    );
    let inv = resolve(std::slice::from_ref(&src), MergePolicy::Replace);

    let declared: &Vars = &inv.host("h").unwrap().vars;
    assert!(!declared.contains_key("ambient"));
    assert_eq!(inv.effective_vars("h").unwrap()["ambient"], Value::Int(1));
}
