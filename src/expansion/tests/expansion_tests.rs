//! Integration tests for the expansion pipeline
//!
//! Models are loaded from JSON the way the command-line driver loads them,
//! then expanded end to end with the reference evaluator.

use aclx_core::{
    AccessControlEntry, AccessControlList, AccessType, AclEvaluator, EvaluationContext, Group,
    GroupCondition, GroupHierarchy, GroupType, Position, SecurableClass, SecurityModel,
    StateDefinition, Tenant, TenantCondition, TenantHierarchy, User, UserCondition,
};
use aclx_expansion::{
    AclExpander, AclExpansionEntryCreator, AclExpansionTreeBuilder, AclFinder, ExpanderConfig,
    ExpansionError, OutputFormat, UserFilter, UserRoleAclAceCombination,
    UserRoleAclAceCombinationFinder,
};
use std::io::Write;

const MODEL_JSON: &str = r#"{
    "tenants": [{ "id": "acme", "name": "Acme" }],
    "group_types": [{ "id": "division", "name": "Division" }],
    "groups": [
        { "id": "g-div", "name": "Sales Division", "tenant": "acme", "group_type": "division" },
        { "id": "g-team", "name": "Sales Team", "tenant": "acme", "parent": "g-div" }
    ],
    "positions": [
        { "id": "clerk", "name": "Clerk" },
        { "id": "manager", "name": "Manager" }
    ],
    "users": [
        {
            "id": "u-doe", "user_name": "jdoe", "first_name": "John", "last_name": "Doe",
            "tenant": "acme",
            "roles": [{ "id": "r-doe", "group": "g-team", "position": "clerk" }]
        },
        {
            "id": "u-roe", "user_name": "jroe", "first_name": "Jane", "last_name": "Roe",
            "tenant": "acme",
            "roles": [{ "id": "r-roe", "group": "g-div", "position": "manager" }]
        }
    ],
    "classes": [{ "id": "invoice", "name": "Invoice" }],
    "states": [
        { "id": "draft", "class": "invoice", "property": "status", "name": "Draft" },
        { "id": "booked", "class": "invoice", "property": "status", "name": "Booked" }
    ],
    "access_types": [
        { "id": "read", "name": "Read" },
        { "id": "edit", "name": "Edit" }
    ],
    "acls": [
        {
            "id": "acl-draft", "class": "invoice", "kind": "stateful", "states": ["draft"],
            "entries": [
                {
                    "id": "draft-own-tenant",
                    "tenant_condition": { "kind": "owning_tenant" },
                    "tenant_hierarchy": "THIS",
                    "allowed": ["read"]
                },
                {
                    "id": "draft-branch",
                    "group_condition": { "kind": "branch_of_owning_group", "group_type": "division" },
                    "allowed": ["edit"]
                }
            ]
        },
        {
            "id": "acl-booked", "class": "invoice", "kind": "stateful", "states": ["booked"],
            "entries": [
                {
                    "id": "booked-own-tenant",
                    "tenant_condition": { "kind": "owning_tenant" },
                    "allowed": ["read"]
                },
                {
                    "id": "booked-roe-only",
                    "user_condition": { "kind": "specific_user", "user": "u-roe" },
                    "allowed": ["edit"]
                }
            ]
        }
    ]
}"#;

fn load_model() -> SecurityModel {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(MODEL_JSON.as_bytes()).unwrap();
    SecurityModel::from_path(file.path()).unwrap()
}

// ============================================================================
// Entry creation scenarios
// ============================================================================

fn scenario_model(entry: AccessControlEntry) -> SecurityModel {
    SecurityModel::builder()
        .tenant(Tenant::new("t-u", "Tenant of U"))
        .group(Group::new("g", "G", "t-u"))
        .position(Position::new("p", "P"))
        .access_type(AccessType::new("read", "Read"))
        .class(SecurableClass::new("doc", "Document"))
        .user(User::new("u", "u").with_tenant("t-u").with_role("r", "g", "p"))
        .user(User::new("v", "v").with_tenant("t-u"))
        .acl(AccessControlList::stateless("acl", "doc").with_entry(entry))
        .build()
        .unwrap()
}

fn create_single(model: &SecurityModel) -> Result<Option<aclx_expansion::AclExpansionEntry>, ExpansionError> {
    let evaluator = AclEvaluator::new();
    let creator = AclExpansionEntryCreator::new(model, &evaluator);
    let role = &model.user("u").unwrap().roles[0];
    let ace = &model.acl("acl").unwrap().entries[0];

    let ctx = EvaluationContext::new(model);
    let _guard = ctx.enter();
    creator.create_entry(&ctx, &UserRoleAclAceCombination::new(role, ace))
}

#[test]
fn test_owning_tenant_grants_read() {
    let model = scenario_model(
        AccessControlEntry::new("e")
            .with_tenant(TenantCondition::OwningTenant, TenantHierarchy::THIS)
            .allow("read"),
    );

    let entry = create_single(&model).unwrap().expect("entry for owning tenant");
    assert_eq!(entry.allowed_access_types().iter().collect::<Vec<_>>(), vec!["read"]);
    assert_eq!(entry.access_conditions().owning_tenant().map(String::as_str), Some("t-u"));
    assert_eq!(entry.access_conditions().tenant_hierarchy(), TenantHierarchy::THIS);
}

#[test]
fn test_specific_other_user_grants_nothing() {
    let model = scenario_model(
        AccessControlEntry::new("e")
            .with_tenant(TenantCondition::OwningTenant, TenantHierarchy::THIS)
            .with_user(UserCondition::SpecificUser { user: "v".into() })
            .allow("read"),
    );

    assert!(create_single(&model).unwrap().is_none());
}

#[test]
fn test_owning_tenant_without_this_is_invalid_probe() {
    let model = scenario_model(
        AccessControlEntry::new("e")
            .with_tenant(TenantCondition::OwningTenant, TenantHierarchy::PARENT)
            .allow("read"),
    );

    let err = create_single(&model).unwrap_err();
    assert!(matches!(err, ExpansionError::InvalidProbe(_)));
    assert!(!err.is_fatal());
}

#[test]
fn test_branch_without_typed_ancestor_never_matches() {
    let model = SecurityModel::builder()
        .tenant(Tenant::new("t-u", "T"))
        .group_type(GroupType::new("region", "Region"))
        .group(Group::new("g", "G", "t-u"))
        .position(Position::new("p", "P"))
        .access_type(AccessType::new("read", "Read"))
        .class(SecurableClass::new("doc", "Document"))
        .user(User::new("u", "u").with_tenant("t-u").with_role("r", "g", "p"))
        .acl(
            AccessControlList::stateless("acl", "doc").with_entry(
                AccessControlEntry::new("e")
                    .with_group(
                        GroupCondition::BranchOfOwningGroup { group_type: "region".into() },
                        GroupHierarchy::THIS,
                    )
                    .allow("read"),
            ),
        )
        .build()
        .unwrap();

    assert!(create_single(&model).unwrap().is_none());
}

// ============================================================================
// Full pipeline over a JSON model
// ============================================================================

#[test]
fn test_pipeline_flat() {
    let model = load_model();
    let evaluator = AclEvaluator::new();
    let expander = AclExpander::new(&model, &evaluator, ExpanderConfig::default()).unwrap();

    let (entries, stats) = expander.run().unwrap();
    // 2 users × 1 role × 4 entries
    assert_eq!(stats.combinations, 8);
    // both own-tenant entries for both users, both branch probes, roe's edit
    assert_eq!(stats.entries, 7);
    assert_eq!(entries.len(), 7);

    let branch = entries
        .iter()
        .find(|e| e.user() == "u-doe" && e.allowed_access_types().contains("edit"))
        .expect("branch entry for doe");
    assert_eq!(branch.access_conditions().owning_group().map(String::as_str), Some("g-div"));
    assert_eq!(
        branch.access_conditions().group_hierarchy(),
        GroupHierarchy::THIS | GroupHierarchy::CHILDREN
    );

    let sorted = expander.sort_distinct(entries.clone());
    assert_eq!(sorted.len(), 7);
    assert!(sorted.iter().take_while(|e| e.user() == "u-doe").count() >= 3);
}

#[test]
fn test_pipeline_tree_collapses_states() {
    let model = load_model();
    let evaluator = AclEvaluator::new();
    let expander = AclExpander::new(&model, &evaluator, ExpanderConfig::default()).unwrap();

    let (entries, _) = expander.run().unwrap();
    let tree = expander.build_tree(&entries);

    assert_eq!(tree.row_count(), entries.len());

    // "Doe, John" sorts before "Roe, Jane"
    let users: Vec<&str> = tree.users().iter().map(|u| u.key().as_str()).collect();
    assert_eq!(users, vec!["u-doe", "u-roe"]);

    // doe: own-tenant read in draft and booked collapse into one leaf of two
    let doe_leaves: Vec<_> = tree.users()[0].children()[0].children()[0].children().to_vec();
    let read_leaf = doe_leaves
        .iter()
        .find(|l| l.key().allowed_access_types().contains("read"))
        .unwrap();
    assert_eq!(read_leaf.row_count(), 2);
    assert_eq!(doe_leaves.len(), 2);
}

#[test]
fn test_tree_regrouping_leaves_input_untouched() {
    let model = load_model();
    let evaluator = AclEvaluator::new();
    let expander = AclExpander::new(&model, &evaluator, ExpanderConfig::default()).unwrap();
    let (entries, _) = expander.run().unwrap();
    let before = entries.clone();

    let default_tree = expander.build_tree(&entries);
    let reversed = AclExpansionTreeBuilder::new(&model)
        .with_class_order(|e| e.class().map(|c| c.chars().rev().collect()).unwrap_or_default())
        .build_tree(&entries);

    assert_eq!(entries, before);
    assert_eq!(default_tree.row_count(), reversed.row_count());
}

#[test]
fn test_parallel_run_matches_sequential() {
    let model = load_model();
    let evaluator = AclEvaluator::new();

    let sequential = AclExpander::new(&model, &evaluator, ExpanderConfig::default())
        .unwrap()
        .run()
        .unwrap();
    let parallel_config = ExpanderConfig {
        parallel: true,
        chunk_size: 1,
        ..Default::default()
    };
    let parallel = AclExpander::new(&model, &evaluator, parallel_config)
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(sequential, parallel);
}

#[test]
fn test_config_filters_users() {
    let model = load_model();
    let evaluator = AclEvaluator::new();
    let config = ExpanderConfig::default()
        .apply_overrides(|key| (key == "ACLX_USER_NAME").then(|| "jroe".to_string()))
        .unwrap();
    assert_eq!(
        config.user_filter,
        UserFilter {
            user_name: Some("jroe".into()),
            ..Default::default()
        }
    );

    let expander = AclExpander::new(&model, &evaluator, config).unwrap();
    let (entries, stats) = expander.run().unwrap();
    assert_eq!(stats.combinations, 4);
    assert!(entries.iter().all(|e| e.user() == "u-roe"));
}

#[test]
fn test_config_file_round_trip() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"{{"output": "flat", "classes": ["invoice"], "chunk_size": 16}}"#).unwrap();

    let config = ExpanderConfig::from_path(file.path()).unwrap();
    assert_eq!(config.output, OutputFormat::Flat);
    assert_eq!(config.chunk_size, 16);

    let model = load_model();
    let evaluator = AclEvaluator::new();
    let expander = AclExpander::new(&model, &evaluator, config).unwrap();
    assert_eq!(expander.run().unwrap().1.combinations, 8);
}

// ============================================================================
// Enumeration
// ============================================================================

#[test]
fn test_enumeration_can_be_abandoned() {
    let model = load_model();
    let acls = AclFinder::new(&model).with_classes(["invoice"]);
    let users: &[User] = model.users();
    let finder = UserRoleAclAceCombinationFinder::new(&users, &acls);

    let first = finder.combinations().next().unwrap();
    assert_eq!(
        first.identity(),
        (&"r-doe".to_string(), &"acl-draft".to_string(), &"draft-own-tenant".to_string())
    );
    assert_eq!(finder.combinations().count(), 8);
}

#[test]
fn test_state_definitions_loaded() {
    let model = load_model();
    assert_eq!(
        model.state("draft"),
        Some(&StateDefinition::new("draft", "invoice", "status", "Draft"))
    );
}
