use crate::{FieldDef, ModelTracking, Result, Value};

/// Lifecycle callback receiving the instance about to be (or just) written.
pub type Hook<M> = fn(&mut M) -> Result<()>;

/// Optional lifecycle callbacks of a model, captured once per collection.
pub struct Hooks<M> {
    /// Runs first in `put`, an error aborts the write.
    pub before_put: Option<Hook<M>>,
    /// Runs last in `put`, after the tracking state advanced.
    pub after_put: Option<Hook<M>>,
}

impl<M> Default for Hooks<M> {
    fn default() -> Self {
        Self {
            before_put: None,
            after_put: None,
        }
    }
}

impl<M> Clone for Hooks<M> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<M> Copy for Hooks<M> {}

impl<M> Hooks<M> {
    pub fn run_before_put(&self, model: &mut M) -> Result<()> {
        match self.before_put {
            Some(hook) => hook(model),
            None => Ok(()),
        }
    }

    pub fn run_after_put(&self, model: &mut M) -> Result<()> {
        match self.after_put {
            Some(hook) => hook(model),
            None => Ok(()),
        }
    }
}

/// A struct persisted as one row of a table.
///
/// Usually implemented through `#[derive(Model)]`. Field indexes refer to
/// positions in [`Model::fields`], which lists every struct field in
/// declaration order (excluded and tracking fields included).
pub trait Model: Send + Sync + 'static {
    /// Unquoted table name.
    fn table_name() -> &'static str;

    fn fields() -> &'static [FieldDef];

    fn tracking(&self) -> &ModelTracking;

    fn tracking_mut(&mut self) -> &mut ModelTracking;

    /// Current value of the column field at `index`.
    fn field_value(&self, index: usize) -> Result<Value>;

    /// Decode `value` into the column field at `index`.
    fn set_field_value(&mut self, index: usize, value: Value) -> Result<()>;

    fn hooks() -> Hooks<Self>
    where
        Self: Sized,
    {
        Hooks::default()
    }
}
