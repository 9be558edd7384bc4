//! Declarative handler sets.
//!
//! A module describes its handlers by returning a [`HandlerSet`]: a list of
//! (path, handler) entries built with [`Handlers`]. The handler signature is
//! fixed by the `route` bound, so a method with the wrong shape does not
//! compile. Paths are validated later, when the set is inserted into the
//! binding table.

use crate::commands::Invocation;
use crate::error::HandlerResult;
use crate::modules::ModuleContext;
use futures_util::future::BoxFuture;
use std::future::Future;
use std::sync::Arc;

/// Type-erased handler still waiting for its module context.
pub type ModuleHandler = Arc<dyn Fn(ModuleContext, Invocation) -> BoxFuture<'static, HandlerResult> + Send + Sync>;

/// One declared (path, handler) pair.
#[derive(Clone)]
pub struct HandlerEntry {
    /// Raw path names as declared; validated on insertion.
    pub path: Vec<String>,
    /// Handler function name, for diagnostics.
    pub name: &'static str,
    pub(crate) handler: ModuleHandler,
}

impl std::fmt::Debug for HandlerEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerEntry")
            .field("path", &self.path)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// All handlers declared by one module, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct HandlerSet {
    entries: Vec<HandlerEntry>,
}

impl HandlerSet {
    pub fn entries(&self) -> &[HandlerEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Builder binding handler functions of module `M` to command paths.
///
/// ```ignore
/// fn handlers(self: Arc<Self>) -> HandlerSet {
///     Handlers::new(self)
///         .route(["config", "set"], Self::set)
///         .routes([["ping"], ["p"]], Self::ping)
///         .build()
/// }
/// ```
pub struct Handlers<M> {
    module: Arc<M>,
    entries: Vec<HandlerEntry>,
}

impl<M: Send + Sync + 'static> Handlers<M> {
    pub fn new(module: Arc<M>) -> Self {
        Self {
            module,
            entries: Vec::new(),
        }
    }

    /// Bind `handler` to one command path.
    pub fn route<P, F, Fut>(mut self, path: P, handler: F) -> Self
    where
        P: IntoIterator,
        P::Item: Into<String>,
        F: Fn(Arc<M>, ModuleContext, Invocation) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        let module = Arc::clone(&self.module);
        let erased: ModuleHandler = Arc::new(move |ctx: ModuleContext, invocation: Invocation| {
            Box::pin(handler(Arc::clone(&module), ctx, invocation)) as BoxFuture<'static, HandlerResult>
        });

        self.entries.push(HandlerEntry {
            path: path.into_iter().map(Into::into).collect(),
            name: std::any::type_name::<F>(),
            handler: erased,
        });
        self
    }

    /// Bind the same handler to several paths; each is inserted on its own.
    pub fn routes<I, P, F, Fut>(mut self, paths: I, handler: F) -> Self
    where
        I: IntoIterator<Item = P>,
        P: IntoIterator,
        P::Item: Into<String>,
        F: Fn(Arc<M>, ModuleContext, Invocation) -> Fut + Clone + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        for path in paths {
            self = self.route(path, handler.clone());
        }
        self
    }

    pub fn build(self) -> HandlerSet {
        HandlerSet {
            entries: self.entries,
        }
    }
}
