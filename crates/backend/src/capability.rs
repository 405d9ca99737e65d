//! Capability tables
//!
//! A backend describes itself with a sparse map from [`Role`] to handler.
//! Roles without a handler are unsupported; hosts can ask before dispatching.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use pk_errors::{BackendError, Error};
use pk_types::{FilterSet, GroupKind, Role};

use crate::transaction::TransactionContext;
use crate::worker::WorkerScheduler;

/// Hook run when a backend is loaded or unloaded
pub type LifecycleHook = Arc<dyn Fn() -> Result<(), Error> + Send + Sync>;

/// Backend-specific reaction to a cancellation request
pub type CancelHook = Arc<dyn Fn(&TransactionContext) + Send + Sync>;

/// Handler bound to one role
pub type OperationHandler = Arc<dyn Fn(&Dispatch<'_>) -> Result<(), Error> + Send + Sync>;

/// What an operation handler receives when its role is dispatched
#[derive(Debug)]
pub struct Dispatch<'a> {
    context: &'a TransactionContext,
    scheduler: &'a WorkerScheduler,
}

impl<'a> Dispatch<'a> {
    pub(crate) fn new(context: &'a TransactionContext, scheduler: &'a WorkerScheduler) -> Self {
        Self { context, scheduler }
    }

    #[must_use]
    pub fn context(&self) -> &'a TransactionContext {
        self.context
    }

    /// Hand the transaction to a worker thread and return immediately.
    ///
    /// # Errors
    ///
    /// Propagates scheduler errors; see [`WorkerScheduler::start`].
    pub fn spawn<F>(&self, task: F) -> Result<(), Error>
    where
        F: FnOnce(&TransactionContext) -> Result<(), Error> + Send + 'static,
    {
        // Detached: the context signals completion.
        self.scheduler.start(self.context, task)?;
        Ok(())
    }
}

/// Sparse role-to-handler map plus backend metadata
#[derive(Clone)]
pub struct CapabilityTable {
    description: String,
    author: String,
    initialize: Option<LifecycleHook>,
    destroy: Option<LifecycleHook>,
    cancel: Option<CancelHook>,
    groups: Vec<GroupKind>,
    filters: FilterSet,
    operations: BTreeMap<Role, OperationHandler>,
}

impl CapabilityTable {
    #[must_use]
    pub fn builder(description: impl Into<String>, author: impl Into<String>) -> CapabilityTableBuilder {
        CapabilityTableBuilder {
            table: CapabilityTable {
                description: description.into(),
                author: author.into(),
                initialize: None,
                destroy: None,
                cancel: None,
                groups: Vec::new(),
                filters: FilterSet::none(),
                operations: BTreeMap::new(),
            },
        }
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn author(&self) -> &str {
        &self.author
    }

    /// Whether a handler is bound for `role`
    #[must_use]
    pub fn supports(&self, role: Role) -> bool {
        self.operations.contains_key(&role)
    }

    #[must_use]
    pub fn supports_cancel(&self) -> bool {
        self.cancel.is_some()
    }

    /// Bound roles in their canonical order
    pub fn roles(&self) -> impl Iterator<Item = Role> + '_ {
        self.operations.keys().copied()
    }

    /// Groups the backend can search, empty when it does not say
    #[must_use]
    pub fn groups(&self) -> &[GroupKind] {
        &self.groups
    }

    /// Filters the backend honours
    #[must_use]
    pub fn filters(&self) -> &FilterSet {
        &self.filters
    }

    pub(crate) fn run_initialize(&self) -> Result<(), Error> {
        self.initialize.as_ref().map_or(Ok(()), |hook| hook())
    }

    pub(crate) fn run_destroy(&self) -> Result<(), Error> {
        self.destroy.as_ref().map_or(Ok(()), |hook| hook())
    }

    pub(crate) fn run_cancel(&self, context: &TransactionContext) -> Result<(), BackendError> {
        let hook = self
            .cancel
            .as_ref()
            .ok_or_else(|| BackendError::not_supported("cancel"))?;
        hook(context);
        Ok(())
    }

    pub(crate) fn invoke(&self, dispatch: &Dispatch<'_>) -> Result<(), Error> {
        let role = dispatch.context().role();
        let handler = self
            .operations
            .get(&role)
            .ok_or_else(|| BackendError::not_supported(role.as_str()))?;
        handler(dispatch)
    }
}

impl fmt::Debug for CapabilityTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapabilityTable")
            .field("description", &self.description)
            .field("author", &self.author)
            .field("initialize", &self.initialize.is_some())
            .field("destroy", &self.destroy.is_some())
            .field("cancel", &self.cancel.is_some())
            .field("groups", &self.groups)
            .field("filters", &self.filters)
            .field("roles", &self.operations.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Builder for [`CapabilityTable`]
pub struct CapabilityTableBuilder {
    table: CapabilityTable,
}

impl CapabilityTableBuilder {
    #[must_use]
    pub fn initialize<F>(mut self, hook: F) -> Self
    where
        F: Fn() -> Result<(), Error> + Send + Sync + 'static,
    {
        self.table.initialize = Some(Arc::new(hook));
        self
    }

    #[must_use]
    pub fn destroy<F>(mut self, hook: F) -> Self
    where
        F: Fn() -> Result<(), Error> + Send + Sync + 'static,
    {
        self.table.destroy = Some(Arc::new(hook));
        self
    }

    #[must_use]
    pub fn cancel<F>(mut self, hook: F) -> Self
    where
        F: Fn(&TransactionContext) + Send + Sync + 'static,
    {
        self.table.cancel = Some(Arc::new(hook));
        self
    }

    #[must_use]
    pub fn groups(mut self, groups: impl IntoIterator<Item = GroupKind>) -> Self {
        self.table.groups = groups.into_iter().collect();
        self
    }

    #[must_use]
    pub fn filters(mut self, filters: FilterSet) -> Self {
        self.table.filters = filters;
        self
    }

    /// Bind `handler` to `role`, replacing any earlier binding
    #[must_use]
    pub fn operation<F>(mut self, role: Role, handler: F) -> Self
    where
        F: Fn(&Dispatch<'_>) -> Result<(), Error> + Send + Sync + 'static,
    {
        self.table.operations.insert(role, Arc::new(handler));
        self
    }

    #[must_use]
    pub fn build(self) -> CapabilityTable {
        self.table
    }
}
