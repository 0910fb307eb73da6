//! The single action set shared by every input source, and the catalogue of actions in it.
//!
//! Many profiles expose the same semantic control under different hardware paths. Actions are
//! keyed by what they mean rather than where they are bound, so all of those profiles end up
//! suggesting bindings for one shared action.

use super::profiles::{AxisType, ButtonFlags, ButtonType, HandScope};
use crate::runtime::{init_path, ActionHandle, ActionSetHandle, Hand, InitError, Runtime};
use log::{debug, trace};
use openxr as xr;
use std::collections::HashMap;
use std::rc::Rc;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ButtonComponent {
    Click,
    Touch,
    Value,
    Ready,
}

impl ButtonComponent {
    pub const ALL: [ButtonComponent; 4] = [
        ButtonComponent::Click,
        ButtonComponent::Touch,
        ButtonComponent::Value,
        ButtonComponent::Ready,
    ];

    /// Path component (and action name suffix) of this part of a button.
    pub fn path_suffix(self) -> &'static str {
        match self {
            ButtonComponent::Click => "click",
            ButtonComponent::Touch => "touch",
            ButtonComponent::Value => "value",
            ButtonComponent::Ready => "ready_ext",
        }
    }

    pub fn flag(self) -> ButtonFlags {
        match self {
            ButtonComponent::Click => ButtonFlags::CLICK,
            ButtonComponent::Touch => ButtonFlags::TOUCH,
            ButtonComponent::Value => ButtonFlags::VALUE,
            ButtonComponent::Ready => ButtonFlags::READY,
        }
    }

    fn action_type(self) -> xr::sys::ActionType {
        match self {
            ButtonComponent::Value => xr::sys::ActionType::FLOAT_INPUT,
            _ => xr::sys::ActionType::BOOLEAN_INPUT,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
enum ActionKey {
    Named(&'static str),
    Button(ButtonType, ButtonComponent),
    Axis(AxisType),
}

/// Actions backing the components of one button. Components the button doesn't declare are
/// `None`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ButtonActions {
    pub click: Option<ActionHandle>,
    pub touch: Option<ActionHandle>,
    pub value: Option<ActionHandle>,
    pub ready: Option<ActionHandle>,
}

impl ButtonActions {
    pub fn get(&self, component: ButtonComponent) -> Option<ActionHandle> {
        match component {
            ButtonComponent::Click => self.click,
            ButtonComponent::Touch => self.touch,
            ButtonComponent::Value => self.value,
            ButtonComponent::Ready => self.ready,
        }
    }

    /// Takes any component `other` has and `self` lacks.
    pub fn merge(&mut self, other: ButtonActions) {
        for component in ButtonComponent::ALL {
            let slot = self.slot(component);
            if slot.is_none() {
                *slot = other.get(component);
            }
        }
    }

    fn slot(&mut self, component: ButtonComponent) -> &mut Option<ActionHandle> {
        match component {
            ButtonComponent::Click => &mut self.click,
            ButtonComponent::Touch => &mut self.touch,
            ButtonComponent::Value => &mut self.value,
            ButtonComponent::Ready => &mut self.ready,
        }
    }
}

pub struct ActionSet<R: Runtime> {
    runtime: Rc<R>,
    handle: ActionSetHandle,
    left_path: xr::Path,
    right_path: xr::Path,
    actions: HashMap<(ActionKey, HandScope), ActionHandle>,
}

impl<R: Runtime> ActionSet<R> {
    pub fn new(runtime: Rc<R>, name: &str) -> Result<Self, InitError> {
        let left_path = init_path(&*runtime, Hand::Left.user_path())?;
        let right_path = init_path(&*runtime, Hand::Right.user_path())?;
        let handle = runtime
            .create_action_set(name, name, 0)
            .map_err(InitError::ActionSetCreationFailed)?;
        debug!("created action set {name}");

        Ok(Self {
            runtime,
            handle,
            left_path,
            right_path,
            actions: HashMap::new(),
        })
    }

    #[inline]
    pub fn handle(&self) -> ActionSetHandle {
        self.handle
    }

    #[inline]
    pub fn subaction_path(&self, hand: Hand) -> xr::Path {
        match hand {
            Hand::Left => self.left_path,
            Hand::Right => self.right_path,
        }
    }

    /// Number of distinct actions created so far.
    pub fn action_count(&self) -> usize {
        self.actions.len()
    }

    fn get_or_create(
        &mut self,
        key: ActionKey,
        hand: HandScope,
        ty: xr::sys::ActionType,
    ) -> Result<ActionHandle, InitError> {
        if let Some(action) = self.actions.get(&(key, hand)) {
            return Ok(*action);
        }

        let qualifier = hand.name_qualifier();
        let name = match key {
            ActionKey::Named(name) => format!("{qualifier}{name}"),
            ActionKey::Button(button, component) => format!(
                "button_{qualifier}{}_{}",
                button.name(),
                component.path_suffix()
            ),
            ActionKey::Axis(axis) => format!("axis_{qualifier}{}", axis.name()),
        };

        let subaction_paths: Vec<xr::Path> =
            hand.hands().map(|h| self.subaction_path(h)).collect();
        let action = self
            .runtime
            .create_action(self.handle, ty, &name, &subaction_paths)
            .map_err(|result| InitError::ActionCreationFailed {
                name: name.clone(),
                result,
            })?;
        trace!("created action {name}");

        self.actions.insert((key, hand), action);
        Ok(action)
    }

    pub fn get_or_create_action(
        &mut self,
        ty: xr::sys::ActionType,
        name: &'static str,
        hand: HandScope,
    ) -> Result<ActionHandle, InitError> {
        self.get_or_create(ActionKey::Named(name), hand, ty)
    }

    /// Returns an action for each component in `flags`. Components are shared with any other
    /// button of the same type and hands, whatever flags it was requested with.
    pub fn get_or_create_button_actions(
        &mut self,
        ty: ButtonType,
        flags: ButtonFlags,
        hand: HandScope,
    ) -> Result<ButtonActions, InitError> {
        let mut actions = ButtonActions::default();
        for component in ButtonComponent::ALL {
            if flags.contains(component.flag()) {
                *actions.slot(component) = Some(self.get_or_create(
                    ActionKey::Button(ty, component),
                    hand,
                    component.action_type(),
                )?);
            }
        }
        Ok(actions)
    }

    pub fn get_or_create_axis_action(
        &mut self,
        ty: AxisType,
        hand: HandScope,
    ) -> Result<ActionHandle, InitError> {
        self.get_or_create(
            ActionKey::Axis(ty),
            hand,
            xr::sys::ActionType::VECTOR2F_INPUT,
        )
    }
}

impl<R: Runtime> Drop for ActionSet<R> {
    fn drop(&mut self) {
        // Destroying the set destroys all of its actions.
        self.runtime.destroy_action_set(self.handle);
    }
}
