//! Command pipeline.
//!
//! A business handler only loads, mutates, stages and marks entities. Two
//! decorators wrap it without the handler knowing:
//!
//! - [`OutboxDecorator`] turns what the handler did into integration events
//!   and stages them in the outbox, then flushes.
//! - [`TransactionDecorator`] runs everything inside one transaction:
//!   begin, inner chain, flush, commit; rollback on any error.
//!
//! The order is fixed: business mutation, outbox enqueue, commit.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, warn};

use crate::command::Command;
use crate::error::DomainError;
use crate::event::IntegrationEvent;
use crate::outbox::OutboxStore;

/// One unit of work over the underlying storage.
#[async_trait]
pub trait UnitOfWork: Send {
    /// Domain events collected from the entities staged in this unit of work.
    type DomainEvent: Send + Sync;

    /// Opens the transaction.
    async fn begin(&mut self) -> Result<(), DomainError>;

    /// Writes all staged changes, in staging order.
    async fn flush(&mut self) -> Result<(), DomainError>;

    /// Commits the open transaction.
    async fn commit(&mut self) -> Result<(), DomainError>;

    /// Rolls back the open transaction and discards staged changes.
    async fn rollback(&mut self) -> Result<(), DomainError>;

    /// The outbox store participating in this unit of work.
    fn outbox(&mut self) -> &mut dyn OutboxStore;

    /// Drains the domain events recorded by staged entities.
    fn take_domain_events(&mut self) -> Vec<Self::DomainEvent>;
}

/// Handles one command type against a unit of work.
#[async_trait]
pub trait CommandHandler<C, U>: Send + Sync
where
    C: Command + 'static,
    U: UnitOfWork + 'static,
{
    /// The value returned on success.
    type Output: Send;

    /// Handles `command`.
    async fn handle(&self, command: &C, uow: &mut U) -> Result<Self::Output, DomainError>;
}

/// Maps internal domain events to external integration events.
pub trait EventTranslator<D>: Send + Sync {
    /// Returns the integration counterpart of `event`, or `None` when the
    /// fact is not meant to leave the boundary.
    fn translate(&self, event: &D) -> Option<Box<dyn IntegrationEvent>>;
}

impl<D, T: EventTranslator<D> + ?Sized> EventTranslator<D> for Arc<T> {
    fn translate(&self, event: &D) -> Option<Box<dyn IntegrationEvent>> {
        (**self).translate(event)
    }
}

/// Produces the integration events to enqueue for one handled command.
pub trait IntegrationEventFactory<C, R, D>: Send + Sync {
    /// Builds zero or more integration events from the command, the
    /// handler's response and the domain events recorded while handling it.
    fn create(
        &self,
        command: &C,
        response: &R,
        domain_events: &[D],
    ) -> Vec<Box<dyn IntegrationEvent>>;
}

/// Default factory: translates the recorded domain events.
#[derive(Debug, Clone)]
pub struct TranslatingEventFactory<T> {
    translator: T,
}

impl<T> TranslatingEventFactory<T> {
    /// Creates a factory backed by `translator`.
    #[must_use]
    pub fn new(translator: T) -> Self {
        Self { translator }
    }
}

impl<C, R, D, T> IntegrationEventFactory<C, R, D> for TranslatingEventFactory<T>
where
    T: EventTranslator<D>,
{
    fn create(
        &self,
        _command: &C,
        _response: &R,
        domain_events: &[D],
    ) -> Vec<Box<dyn IntegrationEvent>> {
        domain_events
            .iter()
            .filter_map(|event| self.translator.translate(event))
            .collect()
    }
}

/// Enqueues integration events after the inner handler succeeds.
#[derive(Debug, Clone)]
pub struct OutboxDecorator<H, F> {
    inner: H,
    factory: F,
}

impl<H, F> OutboxDecorator<H, F> {
    /// Wraps `inner`, using `factory` to derive integration events.
    #[must_use]
    pub fn new(inner: H, factory: F) -> Self {
        Self { inner, factory }
    }
}

#[async_trait]
impl<C, U, H, F> CommandHandler<C, U> for OutboxDecorator<H, F>
where
    C: Command + 'static,
    U: UnitOfWork + 'static,
    H: CommandHandler<C, U>,
    F: IntegrationEventFactory<C, H::Output, U::DomainEvent>,
{
    type Output = H::Output;

    async fn handle(&self, command: &C, uow: &mut U) -> Result<Self::Output, DomainError> {
        let response = self.inner.handle(command, uow).await?;

        let domain_events = uow.take_domain_events();
        let integration_events = self.factory.create(command, &response, &domain_events);
        drop(domain_events);

        for event in &integration_events {
            let record_id = uow.outbox().add(event.as_ref())?;
            debug!(
                command_type = command.command_type(),
                correlation_id = %command.correlation_id(),
                %record_id,
                event_type = event.event_type(),
                "staged outbox record"
            );
        }
        drop(integration_events);

        uow.flush().await?;
        Ok(response)
    }
}

/// Runs the inner chain inside one explicit transaction.
#[derive(Debug, Clone)]
pub struct TransactionDecorator<H> {
    inner: H,
}

impl<H> TransactionDecorator<H> {
    /// Wraps `inner`.
    #[must_use]
    pub fn new(inner: H) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<C, U, H> CommandHandler<C, U> for TransactionDecorator<H>
where
    C: Command + 'static,
    U: UnitOfWork + 'static,
    H: CommandHandler<C, U>,
{
    type Output = H::Output;

    async fn handle(&self, command: &C, uow: &mut U) -> Result<Self::Output, DomainError> {
        uow.begin().await?;

        let outcome = match self.inner.handle(command, uow).await {
            Ok(response) => match uow.flush().await {
                Ok(()) => uow.commit().await.map(|()| response),
                Err(err) => Err(err),
            },
            Err(err) => Err(err),
        };

        match outcome {
            Ok(response) => {
                debug!(
                    command_type = command.command_type(),
                    correlation_id = %command.correlation_id(),
                    "committed"
                );
                Ok(response)
            }
            Err(err) => {
                warn!(
                    command_type = command.command_type(),
                    correlation_id = %command.correlation_id(),
                    error = %err,
                    "rolling back"
                );
                if let Err(rollback_err) = uow.rollback().await {
                    error!(error = %rollback_err, "rollback failed");
                }
                Err(err)
            }
        }
    }
}

/// The full chain for a business handler: transaction around outbox around
/// the handler.
pub type Pipeline<H, F> = TransactionDecorator<OutboxDecorator<H, F>>;

/// Wraps `handler` in the outbox and transaction decorators.
#[must_use]
pub fn pipeline<H, F>(handler: H, factory: F) -> Pipeline<H, F> {
    TransactionDecorator::new(OutboxDecorator::new(handler, factory))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use serde::Serialize;
    use uuid::Uuid;

    use crate::outbox::OutboxRecord;

    #[derive(Debug)]
    struct Rename {
        correlation_id: Uuid,
        fail: bool,
    }

    impl Command for Rename {
        fn command_type(&self) -> &'static str {
            "Rename"
        }

        fn correlation_id(&self) -> Uuid {
            self.correlation_id
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    enum Fact {
        Renamed(Uuid),
        Audited(Uuid),
    }

    #[derive(Debug, Serialize)]
    struct RenamedIntegrationEvent {
        id: Uuid,
        occurred_on: DateTime<Utc>,
        entity_id: Uuid,
    }

    impl IntegrationEvent for RenamedIntegrationEvent {
        fn event_id(&self) -> Uuid {
            self.id
        }

        fn occurred_on(&self) -> DateTime<Utc> {
            self.occurred_on
        }

        fn event_type(&self) -> &'static str {
            "RenamedIntegrationEvent"
        }

        fn to_payload(&self) -> Result<String, serde_json::Error> {
            serde_json::to_string(self)
        }
    }

    struct FactTranslator;

    impl EventTranslator<Fact> for FactTranslator {
        fn translate(&self, event: &Fact) -> Option<Box<dyn IntegrationEvent>> {
            match event {
                Fact::Renamed(id) => Some(Box::new(RenamedIntegrationEvent {
                    id: Uuid::new_v4(),
                    occurred_on: Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap(),
                    entity_id: *id,
                })),
                Fact::Audited(_) => None,
            }
        }
    }

    /// Records every call so tests can assert on ordering.
    #[derive(Default)]
    struct ScriptedUnitOfWork {
        calls: Vec<String>,
        staged: Vec<OutboxRecord>,
        committed: Vec<OutboxRecord>,
        events: Vec<Fact>,
        fail_commit: bool,
    }

    #[async_trait]
    impl UnitOfWork for ScriptedUnitOfWork {
        type DomainEvent = Fact;

        async fn begin(&mut self) -> Result<(), DomainError> {
            self.calls.push("begin".to_owned());
            Ok(())
        }

        async fn flush(&mut self) -> Result<(), DomainError> {
            self.calls.push("flush".to_owned());
            Ok(())
        }

        async fn commit(&mut self) -> Result<(), DomainError> {
            self.calls.push("commit".to_owned());
            if self.fail_commit {
                return Err(DomainError::Infrastructure("commit refused".into()));
            }
            self.committed.append(&mut self.staged);
            Ok(())
        }

        async fn rollback(&mut self) -> Result<(), DomainError> {
            self.calls.push("rollback".to_owned());
            self.staged.clear();
            self.events.clear();
            Ok(())
        }

        fn outbox(&mut self) -> &mut dyn OutboxStore {
            self
        }

        fn take_domain_events(&mut self) -> Vec<Fact> {
            std::mem::take(&mut self.events)
        }
    }

    impl OutboxStore for ScriptedUnitOfWork {
        fn add(&mut self, event: &dyn IntegrationEvent) -> Result<Uuid, DomainError> {
            self.calls.push(format!("add {}", event.event_type()));
            let record = OutboxRecord::pending(event, event.occurred_on())?;
            let id = record.id;
            self.staged.push(record);
            Ok(id)
        }
    }

    struct RenameHandler {
        entity_id: Uuid,
    }

    #[async_trait]
    impl CommandHandler<Rename, ScriptedUnitOfWork> for RenameHandler {
        type Output = Uuid;

        async fn handle(
            &self,
            command: &Rename,
            uow: &mut ScriptedUnitOfWork,
        ) -> Result<Uuid, DomainError> {
            uow.calls.push("handle".to_owned());
            uow.events.push(Fact::Renamed(self.entity_id));
            uow.events.push(Fact::Audited(self.entity_id));
            if command.fail {
                return Err(DomainError::Validation("name taken".into()));
            }
            Ok(self.entity_id)
        }
    }

    struct FixedFactory;

    impl IntegrationEventFactory<Rename, Uuid, Fact> for FixedFactory {
        fn create(
            &self,
            _command: &Rename,
            response: &Uuid,
            _domain_events: &[Fact],
        ) -> Vec<Box<dyn IntegrationEvent>> {
            let occurred_on = Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap();
            (0..2)
                .map(|_| {
                    Box::new(RenamedIntegrationEvent {
                        id: Uuid::new_v4(),
                        occurred_on,
                        entity_id: *response,
                    }) as Box<dyn IntegrationEvent>
                })
                .collect()
        }
    }

    #[tokio::test]
    async fn test_pipeline_orders_mutation_enqueue_commit() {
        // Arrange
        let entity_id = Uuid::new_v4();
        let chain = pipeline(
            RenameHandler { entity_id },
            TranslatingEventFactory::new(FactTranslator),
        );
        let mut uow = ScriptedUnitOfWork::default();
        let command = Rename {
            correlation_id: Uuid::new_v4(),
            fail: false,
        };

        // Act
        let result = chain.handle(&command, &mut uow).await;

        // Assert
        assert_eq!(result.unwrap(), entity_id);
        assert_eq!(
            uow.calls,
            vec![
                "begin",
                "handle",
                "add RenamedIntegrationEvent",
                "flush",
                "flush",
                "commit"
            ]
        );
        assert_eq!(uow.committed.len(), 1);
        assert_eq!(uow.committed[0].event_type, "RenamedIntegrationEvent");
    }

    #[tokio::test]
    async fn test_pipeline_rolls_back_when_handler_fails() {
        // Arrange
        let chain = pipeline(
            RenameHandler {
                entity_id: Uuid::new_v4(),
            },
            TranslatingEventFactory::new(FactTranslator),
        );
        let mut uow = ScriptedUnitOfWork::default();
        let command = Rename {
            correlation_id: Uuid::new_v4(),
            fail: true,
        };

        // Act
        let result = chain.handle(&command, &mut uow).await;

        // Assert
        assert!(matches!(result, Err(DomainError::Validation(_))));
        assert_eq!(uow.calls, vec!["begin", "handle", "rollback"]);
        assert!(uow.committed.is_empty());
        assert!(uow.staged.is_empty());
    }

    #[tokio::test]
    async fn test_commit_failure_is_returned_to_caller() {
        let chain = pipeline(
            RenameHandler {
                entity_id: Uuid::new_v4(),
            },
            TranslatingEventFactory::new(FactTranslator),
        );
        let mut uow = ScriptedUnitOfWork {
            fail_commit: true,
            ..ScriptedUnitOfWork::default()
        };
        let command = Rename {
            correlation_id: Uuid::new_v4(),
            fail: false,
        };

        let result = chain.handle(&command, &mut uow).await;

        assert!(matches!(result, Err(DomainError::Infrastructure(_))));
        assert!(uow.committed.is_empty());
        assert_eq!(uow.calls.last().map(String::as_str), Some("rollback"));
        assert!(uow.staged.is_empty());
    }

    #[tokio::test]
    async fn test_custom_factory_enqueues_every_event_in_order() {
        let entity_id = Uuid::new_v4();
        let chain = pipeline(RenameHandler { entity_id }, FixedFactory);
        let mut uow = ScriptedUnitOfWork::default();
        let command = Rename {
            correlation_id: Uuid::new_v4(),
            fail: false,
        };

        chain.handle(&command, &mut uow).await.unwrap();

        assert_eq!(uow.committed.len(), 2);
        assert!(
            uow.committed
                .iter()
                .all(|r| r.payload.contains(&entity_id.to_string()))
        );
    }

    #[test]
    fn test_translating_factory_drops_untranslated_events() {
        let factory = TranslatingEventFactory::new(Arc::new(FactTranslator));
        let id = Uuid::new_v4();
        let command = Rename {
            correlation_id: Uuid::new_v4(),
            fail: false,
        };

        let events = IntegrationEventFactory::<Rename, Uuid, Fact>::create(
            &factory,
            &command,
            &id,
            &[Fact::Audited(id), Fact::Renamed(id)],
        );

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type(), "RenamedIntegrationEvent");
    }
}
