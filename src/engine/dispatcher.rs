// src/engine/dispatcher.rs

//! Priority-ordered, synchronous hook dispatch.
//!
//! Subscribers declare `(hook, priority)` pairs up front. The builder sorts
//! each hook's handlers once (descending priority, ties in registration
//! order) and the resulting [`Dispatcher`] never changes afterwards.

use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::fmt;

use tracing::trace;

use crate::engine::context::Context;
use crate::engine::events::{Event, Hook};
use crate::errors::Result;

/// Something that reacts to pipeline hooks.
pub trait Subscriber {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Hooks this subscriber handles, each with a priority. Higher runs first.
    fn subscriptions(&self) -> Vec<(Hook, i32)>;

    /// Handle one hook.
    ///
    /// Returning `Err` is reserved for fatal configuration failures and
    /// aborts the dispatch. Test outcomes go into the event as results.
    fn handle(&mut self, hook: Hook, event: &mut Event, ctx: &mut Context) -> Result<()>;
}

type HandlerFn = dyn FnMut(&mut Event, &mut Context) -> Result<()>;

/// Adapter so a closure can be registered for a single hook.
struct FnSubscriber {
    name: String,
    hook: Hook,
    priority: i32,
    handler: Box<HandlerFn>,
}

impl Subscriber for FnSubscriber {
    fn name(&self) -> &str {
        &self.name
    }

    fn subscriptions(&self) -> Vec<(Hook, i32)> {
        vec![(self.hook, self.priority)]
    }

    fn handle(&mut self, _hook: Hook, event: &mut Event, ctx: &mut Context) -> Result<()> {
        (self.handler)(event, ctx)
    }
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    subscriber: usize,
    priority: i32,
}

#[derive(Default)]
pub struct DispatcherBuilder {
    subscribers: Vec<Box<dyn Subscriber>>,
}

impl DispatcherBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscriber(mut self, subscriber: impl Subscriber + 'static) -> Self {
        self.subscribers.push(Box::new(subscriber));
        self
    }

    pub fn boxed(mut self, subscriber: Box<dyn Subscriber>) -> Self {
        self.subscribers.push(subscriber);
        self
    }

    /// Register a closure for one hook.
    pub fn on<F>(self, hook: Hook, priority: i32, name: impl Into<String>, handler: F) -> Self
    where
        F: FnMut(&mut Event, &mut Context) -> Result<()> + 'static,
    {
        self.subscriber(FnSubscriber {
            name: name.into(),
            hook,
            priority,
            handler: Box::new(handler),
        })
    }

    pub fn build(self) -> Dispatcher {
        let mut sequences: BTreeMap<Hook, Vec<Entry>> = BTreeMap::new();

        for (idx, sub) in self.subscribers.iter().enumerate() {
            for (hook, priority) in sub.subscriptions() {
                sequences.entry(hook).or_default().push(Entry {
                    subscriber: idx,
                    priority,
                });
            }
        }

        // `sort_by_key` is stable, so equal priorities keep registration order.
        let sequences = sequences
            .into_iter()
            .map(|(hook, mut entries)| {
                entries.sort_by_key(|e| Reverse(e.priority));
                (hook, entries.into_boxed_slice())
            })
            .collect();

        Dispatcher {
            subscribers: self.subscribers,
            sequences,
        }
    }
}

pub struct Dispatcher {
    subscribers: Vec<Box<dyn Subscriber>>,
    sequences: BTreeMap<Hook, Box<[Entry]>>,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for hook in self.sequences.keys() {
            map.entry(hook, &self.listeners(*hook));
        }
        map.finish()
    }
}

impl Dispatcher {
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::new()
    }

    /// `(name, priority)` of the handlers for `hook`, in dispatch order.
    pub fn listeners(&self, hook: Hook) -> Vec<(&str, i32)> {
        self.sequences
            .get(&hook)
            .map(|entries| {
                entries
                    .iter()
                    .map(|e| (self.subscribers[e.subscriber].name(), e.priority))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn has_listeners(&self, hook: Hook) -> bool {
        self.sequences.get(&hook).is_some_and(|e| !e.is_empty())
    }

    /// Run every handler registered for `hook`, in order, on the same event.
    pub fn dispatch(&mut self, hook: Hook, event: &mut Event, ctx: &mut Context) -> Result<()> {
        let Some(entries) = self.sequences.get(&hook) else {
            trace!(%hook, "no listeners");
            return Ok(());
        };

        for entry in entries.iter() {
            let subscriber = &mut self.subscribers[entry.subscriber];
            trace!(%hook, subscriber = subscriber.name(), priority = entry.priority, "dispatch");
            subscriber.handle(hook, event, ctx)?;
        }
        Ok(())
    }
}
