//! In-process command bus.
//!
//! Routes each command to the single handler registered for its type, running
//! the registered middleware chain around it. Handlers and middleware are
//! registered during wiring; after that the bus is shared read-only.
//!
//! # Example
//!
//! ```ignore
//! let mut bus: CommandBus<AssetCommandError> = CommandBus::new();
//! bus.use_middleware(TracingMiddleware::new("assets"));
//! bus.register_handler(move |cmd: CreateAsset| {
//!     let handler = Arc::clone(&handler);
//!     async move { handler.handle(cmd).await.map_err(AssetCommandError::from) }
//! })?;
//!
//! let version = bus.dispatch(create_asset).await?;
//! ```

use async_trait::async_trait;
use futures::future::BoxFuture;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tracing::Instrument;

use crate::domain::foundation::ErrorCode;

/// A request routed through the bus.
pub trait Command: Send + 'static {
    /// Name used in logs and spans.
    const COMMAND_NAME: &'static str;

    /// Value the handler returns on success.
    type Output: Send + 'static;
}

/// Errors raised by the bus itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandBusError {
    #[error("a handler is already registered for command {command}")]
    DuplicateHandler { command: &'static str },

    #[error("no handler registered for command {command}")]
    HandlerNotFound { command: &'static str },

    #[error("middleware altered the payload or output of command {command}")]
    PayloadMismatch { command: &'static str },
}

impl CommandBusError {
    pub fn code(&self) -> ErrorCode {
        match self {
            CommandBusError::DuplicateHandler { .. } => ErrorCode::Conflict,
            CommandBusError::HandlerNotFound { .. } => ErrorCode::NotFound,
            CommandBusError::PayloadMismatch { .. } => ErrorCode::InternalError,
        }
    }
}

/// Type-erased handler result, as seen by middleware.
pub type CommandOutput = Box<dyn Any + Send>;

type ErasedHandler<E> =
    Arc<dyn Fn(Box<dyn Any + Send>) -> BoxFuture<'static, Result<CommandOutput, E>> + Send + Sync>;

/// A command on its way through the middleware chain.
pub struct DispatchedCommand {
    name: &'static str,
    payload: Box<dyn Any + Send>,
}

impl DispatchedCommand {
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Borrows the concrete command, if it is a `C`.
    pub fn downcast_ref<C: Command>(&self) -> Option<&C> {
        self.payload.downcast_ref::<C>()
    }
}

impl fmt::Debug for DispatchedCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchedCommand")
            .field("name", &self.name)
            .finish()
    }
}

/// Cross-cutting behavior wrapped around every dispatch.
///
/// Call `next.run(command)` to continue the chain; returning without calling
/// it short-circuits the handler.
#[async_trait]
pub trait Middleware<E>: Send + Sync {
    async fn handle(&self, command: DispatchedCommand, next: Next<'_, E>)
        -> Result<CommandOutput, E>;
}

/// The rest of the middleware chain, ending in the handler.
pub struct Next<'a, E> {
    middlewares: &'a [Arc<dyn Middleware<E>>],
    handler: &'a ErasedHandler<E>,
}

impl<'a, E: Send + 'static> Next<'a, E> {
    pub async fn run(self, command: DispatchedCommand) -> Result<CommandOutput, E> {
        match self.middlewares.split_first() {
            Some((middleware, rest)) => {
                let next = Next {
                    middlewares: rest,
                    handler: self.handler,
                };
                middleware.handle(command, next).await
            }
            None => (self.handler)(command.payload).await,
        }
    }
}

/// Command bus with one handler per command type.
///
/// `E` is the error type every handler returns; bus failures are converted
/// into it.
pub struct CommandBus<E> {
    handlers: HashMap<TypeId, ErasedHandler<E>>,
    middlewares: Vec<Arc<dyn Middleware<E>>>,
}

impl<E> CommandBus<E>
where
    E: From<CommandBusError> + Send + 'static,
{
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
            middlewares: Vec::new(),
        }
    }

    /// Registers the handler for commands of type `C`.
    ///
    /// # Errors
    ///
    /// - `DuplicateHandler` if `C` already has a handler
    pub fn register_handler<C, H, Fut>(&mut self, handler: H) -> Result<(), CommandBusError>
    where
        C: Command,
        H: Fn(C) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<C::Output, E>> + Send + 'static,
    {
        let type_id = TypeId::of::<C>();
        if self.handlers.contains_key(&type_id) {
            return Err(CommandBusError::DuplicateHandler {
                command: C::COMMAND_NAME,
            });
        }

        let erased: ErasedHandler<E> = Arc::new(move |payload: Box<dyn Any + Send>| {
            match payload.downcast::<C>() {
                Ok(command) => {
                    let fut = handler(*command);
                    Box::pin(async move { fut.await.map(|output| Box::new(output) as CommandOutput) })
                        as BoxFuture<'static, Result<CommandOutput, E>>
                }
                Err(_) => Box::pin(futures::future::ready(Err(E::from(
                    CommandBusError::PayloadMismatch {
                        command: C::COMMAND_NAME,
                    },
                )))) as BoxFuture<'static, Result<CommandOutput, E>>,
            }
        });

        self.handlers.insert(type_id, erased);
        tracing::debug!(command = C::COMMAND_NAME, "command handler registered");
        Ok(())
    }

    /// Appends a middleware. The first registered runs outermost.
    pub fn use_middleware<M: Middleware<E> + 'static>(&mut self, middleware: M) {
        self.middlewares.push(Arc::new(middleware));
    }

    pub fn has_handler<C: Command>(&self) -> bool {
        self.handlers.contains_key(&TypeId::of::<C>())
    }

    /// Routes the command through the middleware chain to its handler.
    ///
    /// The handler's result, including its error, is returned unchanged.
    ///
    /// # Errors
    ///
    /// - `HandlerNotFound` if no handler is registered for `C`
    pub async fn dispatch<C: Command>(&self, command: C) -> Result<C::Output, E> {
        let handler = self.handlers.get(&TypeId::of::<C>()).ok_or_else(|| {
            E::from(CommandBusError::HandlerNotFound {
                command: C::COMMAND_NAME,
            })
        })?;

        let dispatched = DispatchedCommand {
            name: C::COMMAND_NAME,
            payload: Box::new(command),
        };
        let next = Next {
            middlewares: &self.middlewares,
            handler,
        };

        let output = next.run(dispatched).await?;
        output.downcast::<C::Output>().map(|output| *output).map_err(|_| {
            E::from(CommandBusError::PayloadMismatch {
                command: C::COMMAND_NAME,
            })
        })
    }
}

impl<E> Default for CommandBus<E>
where
    E: From<CommandBusError> + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for CommandBus<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandBus")
            .field("handlers", &self.handlers.len())
            .field("middlewares", &self.middlewares.len())
            .finish()
    }
}

// ============================================
// Tracing middleware
// ============================================

/// Runs each dispatch inside a `command` span.
#[derive(Debug, Clone)]
pub struct TracingMiddleware {
    service: String,
}

impl TracingMiddleware {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }
}

#[async_trait]
impl<E: Send + 'static> Middleware<E> for TracingMiddleware {
    async fn handle(
        &self,
        command: DispatchedCommand,
        next: Next<'_, E>,
    ) -> Result<CommandOutput, E> {
        let span = tracing::info_span!(
            "command",
            command.name = command.name(),
            "command.bus.type" = "inmemory",
            command.bus.service = %self.service,
        );

        let result = next.run(command).instrument(span.clone()).await;
        span.in_scope(|| match &result {
            Ok(_) => tracing::debug!("command handled"),
            Err(_) => tracing::warn!("command failed"),
        });
        result
    }
}
