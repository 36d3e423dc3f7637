//! Skin variables
//!
//! A variable is a named [`Function`] with an optional condition and a
//! caching policy. Several declarations may share an id; lookups pick the
//! first one whose condition holds.

use std::cell::{Cell, RefCell};
use std::str::FromStr;

use crate::{EvalContext, ExprError, Function, TemplateString, Value};

/// When a cached variable value is recomputed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EvalPolicy {
    /// Recomputed on every access
    #[default]
    Always,
    /// Fresh until the skin's tick timestamp moves past it
    Tick,
    /// Fresh until the skin's switch timestamp moves past it
    Switch,
    /// Computed once and kept
    Once,
    /// Fresh for the given number of milliseconds
    Interval(u64),
}

impl FromStr for EvalPolicy {
    type Err = ExprError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "always" => Ok(Self::Always),
            "tick" => Ok(Self::Tick),
            "switch" => Ok(Self::Switch),
            "once" => Ok(Self::Once),
            _ => s
                .strip_prefix("interval:")
                .and_then(|ms| ms.trim().parse().ok())
                .map(Self::Interval)
                .ok_or_else(|| ExprError::InvalidPolicy(s.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
struct Cached {
    value: Value,
    at: u64,
}

/// One `<variable>` declaration
#[derive(Debug)]
pub struct Variable {
    id: String,
    function: Function,
    condition: Option<Function>,
    policy: EvalPolicy,
    cache: RefCell<Option<Cached>>,
    evaluating: Cell<bool>,
}

impl Variable {
    pub fn new(id: impl Into<String>, function: Function) -> Self {
        Self {
            id: id.into(),
            function,
            condition: None,
            policy: EvalPolicy::default(),
            cache: RefCell::new(None),
            evaluating: Cell::new(false),
        }
    }

    pub fn with_condition(mut self, condition: Function) -> Self {
        self.condition = Some(condition);
        self
    }

    pub fn with_policy(mut self, policy: EvalPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn policy(&self) -> EvalPolicy {
        self.policy
    }

    pub fn function(&self) -> &Function {
        &self.function
    }

    pub fn has_condition(&self) -> bool {
        self.condition.is_some()
    }

    /// True when there is no condition or it evaluates true
    pub fn condition_holds(&self, ctx: &dyn EvalContext) -> bool {
        let Some(condition) = &self.condition else {
            return true;
        };
        self.guarded(Value::Boolean(false), || Value::Boolean(condition.evaluate_bool(ctx)))
            .as_bool()
    }

    /// Current value, served from the cache while the policy allows it
    pub fn value(&self, ctx: &dyn EvalContext) -> Value {
        if let Some(cached) = self.cache.borrow().as_ref() {
            if self.is_fresh(cached.at, ctx) {
                return cached.value.clone();
            }
        }

        let value = self.guarded(Value::Boolean(false), || self.compute(ctx));
        if self.policy != EvalPolicy::Always {
            *self.cache.borrow_mut() = Some(Cached {
                value: value.clone(),
                at: ctx.now(),
            });
        }
        value
    }

    /// Drop the cached value
    pub fn invalidate(&self) {
        self.cache.borrow_mut().take();
    }

    fn is_fresh(&self, at: u64, ctx: &dyn EvalContext) -> bool {
        match self.policy {
            EvalPolicy::Always => false,
            EvalPolicy::Once => true,
            EvalPolicy::Tick => at >= ctx.tick_timestamp(),
            EvalPolicy::Switch => at >= ctx.switch_timestamp(),
            EvalPolicy::Interval(ms) => ctx.now().saturating_sub(at) < ms,
        }
    }

    fn compute(&self, ctx: &dyn EvalContext) -> Value {
        let value = self.function.evaluate_or(Value::Boolean(false), ctx);
        let Value::String(text) = &value else {
            return value;
        };
        if !text.contains('{') && !text.starts_with('#') {
            return value;
        }
        match TemplateString::parse(text, ctx) {
            Ok(template) => template.evaluate(ctx),
            Err(err) => {
                tracing::warn!("Variable #{}: cannot expand '{}': {}", self.id, text, err);
                value
            }
        }
    }

    /// Run `f` unless this variable is already being evaluated further up
    /// the stack, in which case the reference is a cycle.
    fn guarded(&self, fallback: Value, f: impl FnOnce() -> Value) -> Value {
        if self.evaluating.replace(true) {
            tracing::warn!("Variable #{} references itself", self.id);
            return fallback;
        }
        let value = f();
        self.evaluating.set(false);
        value
    }
}

/// All variables of a skin, in declaration order
#[derive(Debug, Default)]
pub struct VariableTable {
    variables: Vec<Variable>,
}

impl VariableTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, variable: Variable) {
        self.variables.push(variable);
    }

    /// First declaration of `id` whose condition holds
    pub fn get(&self, id: &str, ctx: &dyn EvalContext) -> Option<&Variable> {
        self.variables
            .iter()
            .filter(|v| v.id == id)
            .find(|v| v.condition_holds(ctx))
    }

    pub fn value(&self, id: &str, ctx: &dyn EvalContext) -> Option<Value> {
        self.get(id, ctx).map(|v| v.value(ctx))
    }

    /// True when at least one declaration uses `id`
    pub fn contains(&self, id: &str) -> bool {
        self.variables.iter().any(|v| v.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Variable> {
        self.variables.iter()
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// Drop every cached value
    pub fn invalidate(&self) {
        for variable in &self.variables {
            variable.invalidate();
        }
    }
}
