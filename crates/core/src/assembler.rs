//! Assembly seams: the collaborators the cache orchestrates but does not
//! implement.
//!
//! - [`FormAssembler`] turns a [`FormRequest`] into a bound [`Form`]
//! - [`FormDataSource`] supplies previously submitted data
//! - [`FormPreprocessor`] lets independent features adjust a form before binding

use async_trait::async_trait;
use std::future::Future;

use crate::error::AssemblyError;
use crate::form::{Form, FormData, FormRequest};

/// Builds, validates and binds a form.
///
/// Implementations discover composition sources through the path registry.
/// The cache calls this only on a miss or a forced rebuild.
#[async_trait]
pub trait FormAssembler: Send + Sync {
    async fn assemble(&self, request: &FormRequest) -> Result<Form, AssemblyError>;
}

/// Supplies the data used to pre-populate a form.
///
/// Only consulted when `FormOptions::load_saved_data` is set.
#[async_trait]
pub trait FormDataSource: Send + Sync {
    /// Data source name (e.g., "static", "json_file").
    fn name(&self) -> &str;

    /// Load previously submitted data for the named form.
    async fn load_data(&self, form: &str) -> Result<FormData, AssemblyError>;
}

/// A hook run on every assembled form after composition and before binding.
#[async_trait]
pub trait FormPreprocessor: Send + Sync {
    fn name(&self) -> &str;

    async fn preprocess(&self, form: &mut Form, data: &FormData) -> Result<(), AssemblyError>;
}

/// Adapter that lets a plain async closure act as an assembler.
pub struct FnAssembler<F> {
    f: F,
}

/// Wrap a closure `Fn(FormRequest) -> impl Future<Output = Result<Form, AssemblyError>>`.
pub fn assemble_fn<F, Fut>(f: F) -> FnAssembler<F>
where
    F: Fn(FormRequest) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Form, AssemblyError>> + Send,
{
    FnAssembler { f }
}

#[async_trait]
impl<F, Fut> FormAssembler for FnAssembler<F>
where
    F: Fn(FormRequest) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Form, AssemblyError>> + Send,
{
    async fn assemble(&self, request: &FormRequest) -> Result<Form, AssemblyError> {
        (self.f)(request.clone()).await
    }
}
