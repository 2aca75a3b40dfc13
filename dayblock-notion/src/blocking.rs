//! Synchronous face of the async client, for the interactive core.

use std::future::Future;
use std::sync::Arc;

use dayblock_core::{StoreError, Task, TaskDraft, TaskPatch, TaskQuery, TaskStore};

use crate::client::NotionClient;
use crate::error::NotionError;

/// Drive a future to completion from synchronous code.
///
/// The binary runs under `#[tokio::main]`, so a runtime is usually already
/// current; nesting `block_on` there would panic. Inside a multi-thread
/// runtime use `block_in_place`, otherwise spin up a private runtime.
pub fn block_on<F, T>(fut: F) -> Result<T, NotionError>
where
    F: Future<Output = Result<T, NotionError>>,
{
    if let Ok(handle) = tokio::runtime::Handle::try_current() {
        tokio::task::block_in_place(|| handle.block_on(fut))
    } else {
        let rt = tokio::runtime::Runtime::new()?;
        rt.block_on(fut)
    }
}

/// [`TaskStore`] over a shared [`NotionClient`].
#[derive(Debug, Clone)]
pub struct BlockingStore {
    client: Arc<NotionClient>,
}

impl BlockingStore {
    pub fn new(client: NotionClient) -> Self {
        Self {
            client: Arc::new(client),
        }
    }

    pub fn client(&self) -> Arc<NotionClient> {
        Arc::clone(&self.client)
    }
}

impl TaskStore for BlockingStore {
    fn query(&self, query: &TaskQuery) -> Result<Vec<Task>, StoreError> {
        Ok(block_on(self.client.query(query))?)
    }

    fn patch(&self, task_id: &str, patch: &TaskPatch) -> Result<(), StoreError> {
        Ok(block_on(self.client.patch(task_id, patch))?)
    }

    fn create(&self, draft: &TaskDraft) -> Result<String, StoreError> {
        Ok(block_on(self.client.create(draft))?)
    }
}
