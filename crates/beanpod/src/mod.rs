//! # beanpod: reflection-free object composition
//!
//! A bean repository maps type keys to construction strategies and hands out
//! fully-wired instances. There is no scanning, no annotations and no
//! runtime type discovery: every bean, every dependency and every interface
//! binding is declared explicitly when the repository is configured.
//!
//! ## Architecture
//!
//! ```text
//! RepositoryBuilder          BeanRepository               providers
//! ─────────────────          ──────────────               ─────────
//! singleton(ctor)      ──▶   validate + probe   ──▶   Singleton (cached)
//! prototype(ctor)            │                         Prototype (fresh)
//! instance(value)            ├── get::<T>()            Instance  (pre-built)
//! singleton_factory(…)       ├── get_beans_of_type     {Singleton,Prototype}Factory
//! alias(cast) / bind(cast)   ├── get_provider          Alias     (forwards)
//! lazy_singletons(bool)      └── get_prototype
//! build()                         │
//!                                 ▼
//!                            BeanAccessor (restricted view inside ctors)
//! ```
//!
//! ## Guarantees
//!
//! - **At-most-once construction** for singletons, decided by a per-provider
//!   double-checked cell; every observer sees a fully initialised instance.
//! - **Build-time failure** for unresolvable or cyclic dependency graphs:
//!   [`RepositoryBuilder::build`] walks every registration before returning
//!   a repository, and a cycle fails with a named
//!   [`Error::CircularDependency`] rather than exhausting the stack.
//! - **One-time initialisation**: a bean overriding
//!   [`Lifecycle::on_ready`] is called exactly once per real construction,
//!   after its dependencies exist and before anyone else sees it.
//! - **Module composition**: repositories chain through parents; lookups
//!   fall back to ancestors, shadowing is a build error, and a parent bean
//!   keeps one identity no matter which child resolves it.
//!
//! ## Example
//!
//! ```
//! use beanpod::{BeanRepository, Lifecycle};
//! use std::sync::Arc;
//!
//! struct PrintService;
//! impl Lifecycle for PrintService {}
//!
//! struct MailService {
//!     printer: Arc<PrintService>,
//! }
//! impl Lifecycle for MailService {}
//!
//! # fn main() -> beanpod::Result<()> {
//! let repository = BeanRepository::builder("app")
//!     .singleton(|_| Ok(PrintService))
//!     .singleton(|beans| {
//!         Ok(MailService {
//!             printer: beans.get()?,
//!         })
//!     })
//!     .build()?;
//!
//! let mail = repository.get::<MailService>()?;
//! assert!(Arc::ptr_eq(&mail.printer, &repository.get::<PrintService>()?));
//! # Ok(())
//! # }
//! ```

pub mod accessor;
pub mod builder;
pub mod error;
pub mod factory;
pub mod handle;
pub mod key;
pub mod lifecycle;
pub mod provider;
pub mod repository;

mod dry_run;
mod resolution;

pub use accessor::BeanAccessor;
pub use builder::RepositoryBuilder;
pub use error::{Error, Result};
pub use factory::BeanFactory;
pub use handle::{BeanHandle, DynBeanHandle};
pub use key::BeanKey;
pub use lifecycle::Lifecycle;
pub use provider::Scope;
pub use repository::BeanRepository;
