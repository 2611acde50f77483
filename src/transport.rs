use anyhow::Result;
use std::future::Future;
use std::pin::Pin;

use crate::model::{ChatCompletion, ChatRequest};

pub type CompletionFuture<'a> = Pin<Box<dyn Future<Output = Result<ChatCompletion>> + 'a>>;

/// Anything that can turn a chat request into a completion.
pub trait CompletionTransport {
    fn complete<'a>(&'a self, request: &'a ChatRequest) -> CompletionFuture<'a>;
}
