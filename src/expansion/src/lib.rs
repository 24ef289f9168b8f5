//! # aclx expansion engine
//!
//! Expands access-control lists into a flat permissions matrix: for every
//! user, every role they hold and every entry of every list, what that role
//! may do and under which assumptions about the protected object.
//!
//! ## Features
//!
//! - **Probing** with synthetic security tokens that carry exactly one role
//! - **Attribution** through the evaluator's contribution tracking, so an
//!   entry is credited only when it took part in the decision
//! - **Lazy, restartable enumeration** of (role, entry) combinations
//! - **State-ignoring grouping** into a user → role → class → leaf tree
//! - **Parallel expansion** over disjoint user chunks with rayon
//!
//! ## Example
//!
//! ```rust
//! use aclx_core::{
//!     AccessControlEntry, AccessControlList, AccessType, AclEvaluator, Group, Position,
//!     SecurableClass, SecurityModel, Tenant, TenantCondition, TenantHierarchy, User,
//! };
//! use aclx_expansion::{AclExpander, ExpanderConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let model = SecurityModel::builder()
//!         .tenant(Tenant::new("acme", "Acme"))
//!         .group(Group::new("sales", "Sales", "acme"))
//!         .position(Position::new("clerk", "Clerk"))
//!         .access_type(AccessType::new("read", "Read"))
//!         .class(SecurableClass::new("invoice", "Invoice"))
//!         .user(User::new("u1", "jdoe").with_tenant("acme").with_role("r1", "sales", "clerk"))
//!         .acl(
//!             AccessControlList::stateless("invoices", "invoice").with_entry(
//!                 AccessControlEntry::new("own-tenant")
//!                     .with_tenant(TenantCondition::OwningTenant, TenantHierarchy::THIS)
//!                     .allow("read"),
//!             ),
//!         )
//!         .build()?;
//!
//!     let evaluator = AclEvaluator::new();
//!     let expander = AclExpander::new(&model, &evaluator, ExpanderConfig::default())?;
//!     let (entries, stats) = expander.run()?;
//!
//!     assert_eq!(stats.entries, 1);
//!     assert_eq!(entries[0].access_conditions().owning_tenant().map(String::as_str), Some("acme"));
//!
//!     let tree = expander.build_tree(&entries);
//!     assert_eq!(tree.row_count(), 1);
//!     Ok(())
//! }
//! ```

pub mod conditions;
pub mod config;
pub mod creator;
pub mod entry;
pub mod error;
pub mod expander;
pub mod finder;
pub mod hierarchy;
pub mod probe;
pub mod sources;
pub mod tree;

// Re-export commonly used types
pub use conditions::{AccessConditions, AccessConditionsBuilder};
pub use config::{ExpanderConfig, OutputFormat};
pub use creator::{derive_class, AclExpansionEntryCreator, EntryOutcome};
pub use entry::{AclExpansionEntry, IgnoreStateEquivalence, IgnoreStateKey};
pub use error::{ExpansionError, Result};
pub use expander::{AclExpander, ExpansionStats};
pub use finder::{AclSource, UserRoleAclAceCombination, UserRoleAclAceCombinationFinder, UserSource};
pub use hierarchy::{CacheStats, GroupChainResolver};
pub use probe::{AclProbe, ProbeBuilder};
pub use sources::{AclFinder, UserFilter, UserFinder};
pub use tree::{
    AclExpansionTree, AclExpansionTreeBuilder, AclExpansionTreeNode, ClassNode, LeafNode,
    RoleNode, UserNode,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
