//! Request dispatch: validate, look up, translate, submit.
//!
//! The [`Dispatcher`] is the seam between the HTTP surface and the layout.
//! For every action it validates the target id, re-reads the component's
//! state (dialect changes between requests are expected, so nothing is
//! memoized), runs the translator, and hands each resulting descriptor to
//! the [`CommandSink`]. Submission is fire-and-forget; a sink failure is
//! logged and surfaced as a generic dispatch error, never retried here.

use std::sync::Arc;

use tracing::{debug, error};

use crate::commands::CommandDescriptor;
use crate::dialect::Dialect;
use crate::error::{Error, Result};
use crate::intents::{AccessoryAction, MovableAction, RouteAction, SwitchAction};
use crate::layout::{CommandSink, ComponentState, LayoutState};
use crate::scope::CommandScope;
use crate::translator::{
    halt_descriptor, stop_all_descriptors, translate_accessory, translate_movable,
    translate_route, translate_switch, TranslatorOptions,
};

/// Routes validated intents onto the layout.
#[derive(Clone)]
pub struct Dispatcher {
    layout: Arc<dyn LayoutState>,
    sink: Arc<dyn CommandSink>,
    options: TranslatorOptions,
}

impl Dispatcher {
    pub fn new(
        layout: Arc<dyn LayoutState>,
        sink: Arc<dyn CommandSink>,
        options: TranslatorOptions,
    ) -> Self {
        Dispatcher {
            layout,
            sink,
            options,
        }
    }

    /// Current state of a component, validated and looked up fresh.
    pub fn component_state(&self, scope: CommandScope, id: u16) -> Result<ComponentState> {
        scope.validate_id(id)?;
        self.layout
            .query(scope, id)
            .ok_or(Error::NotFound { scope, id })
    }

    /// Dialect of a movable unit, re-read per request.
    fn dialect_of(&self, scope: CommandScope, id: u16) -> Result<Dialect> {
        Ok(self.component_state(scope, id)?.dialect_or_classic())
    }

    /// Dispatch an engine or train action.
    pub fn movable(&self, scope: CommandScope, id: u16, action: MovableAction) -> Result<String> {
        if !scope.is_movable() {
            return Err(Error::validation(format!(
                "{} {id} is not a movable unit",
                scope.title()
            )));
        }
        scope.validate_id(id)?;
        let dialect = self.dialect_of(scope, id)?;
        let descriptors = translate_movable(scope, id, dialect, action, self.options)?;
        self.submit_all(&descriptors)?;
        Ok(confirmation(scope, id, descriptors.len()))
    }

    /// Dispatch an accessory action.
    pub fn accessory(&self, id: u16, action: AccessoryAction) -> Result<String> {
        let scope = CommandScope::Accessory;
        scope.validate_id(id)?;
        self.component_state(scope, id)?;
        let descriptors = translate_accessory(id, action)?;
        self.submit_all(&descriptors)?;
        Ok(confirmation(scope, id, descriptors.len()))
    }

    /// Dispatch a switch action.
    pub fn switch(&self, id: u16, action: SwitchAction) -> Result<String> {
        let scope = CommandScope::Switch;
        scope.validate_id(id)?;
        self.component_state(scope, id)?;
        let descriptors = translate_switch(id, action);
        self.submit_all(&descriptors)?;
        Ok(confirmation(scope, id, descriptors.len()))
    }

    /// Dispatch a route action.
    pub fn route(&self, id: u16, action: RouteAction) -> Result<String> {
        let scope = CommandScope::Route;
        scope.validate_id(id)?;
        self.component_state(scope, id)?;
        let descriptors = translate_route(id, action);
        self.submit_all(&descriptors)?;
        Ok(confirmation(scope, id, descriptors.len()))
    }

    /// Emergency halt: all motion and power, both dialects, immediately.
    pub fn halt(&self) -> Result<String> {
        self.submit_all(&[halt_descriptor()])?;
        Ok("layout halted".to_string())
    }

    /// Stop every engine and train via the universal address.
    pub fn stop_all(&self) -> Result<String> {
        self.submit_all(&stop_all_descriptors())?;
        Ok("all engines and trains stopped".to_string())
    }

    fn submit_all(&self, descriptors: &[CommandDescriptor]) -> Result<()> {
        for descriptor in descriptors {
            debug!(?descriptor, "submitting");
            if let Err(reason) = self.sink.submit(descriptor) {
                error!(?descriptor, %reason, "command submission failed");
                return Err(Error::dispatch(format!(
                    "command submission failed: {reason}"
                )));
            }
        }
        Ok(())
    }
}

fn confirmation(scope: CommandScope, id: u16, count: usize) -> String {
    if count == 1 {
        format!("{} {id}: command dispatched", scope.title())
    } else {
        format!("{} {id}: {count} commands dispatched", scope.title())
    }
}
