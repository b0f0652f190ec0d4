//! Named expressions shared between outputs.

use crate::error::ConfigError;
use crate::expr::{EvalContext, Expr, VariableId};
use crate::registry::DeviceRegistry;

/// The table of variables, in declaration order.
///
/// A variable may only reference variables declared before it, so evaluating in declaration order
/// sees every dependency already updated for the current tick.
#[derive(Debug, Default)]
pub struct Variables {
    names: Vec<String>,
    exprs: Vec<Expr>,
    values: Vec<Option<f32>>,
}

impl Variables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a variable.
    pub fn define(&mut self, name: &str, expr: Expr) -> Result<VariableId, ConfigError> {
        if self.find(name).is_some() {
            return Err(ConfigError::DuplicateVariable(name.into()));
        }
        self.names.push(name.into());
        self.exprs.push(expr);
        self.values.push(None);
        Ok(VariableId(self.names.len() - 1))
    }

    pub fn find(&self, name: &str) -> Option<VariableId> {
        self.names.iter().position(|n| n == name).map(VariableId)
    }

    /// Re-evaluates every variable once, in declaration order.
    pub fn evaluate(&mut self, registry: &DeviceRegistry) {
        for (i, expr) in self.exprs.iter().enumerate() {
            let (earlier, rest) = self.values.split_at_mut(i);
            rest[0] = expr.evaluate(&EvalContext {
                registry,
                variables: earlier,
            });
        }
    }

    /// The values computed by the last [`Variables::evaluate`], indexed by [`VariableId`].
    pub fn values(&self) -> &[Option<f32>] {
        &self.values
    }

    pub fn get(&self, id: VariableId) -> Option<f32> {
        self.values.get(id.0).copied().flatten()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{ChannelId, ChannelType};
    use crate::expr::Scope;
    use crate::test::FakeDevice;

    const ABS_X: ChannelId = ChannelId::new(ChannelType::Abs, 0);

    fn define(vars: &mut Variables, registry: &DeviceRegistry, name: &str, text: &str) {
        let expr = Expr::parse(
            text,
            &Scope {
                registry,
                variables: vars,
            },
        )
        .unwrap();
        vars.define(name, expr).unwrap();
    }

    #[test]
    fn chained() {
        let mut registry = DeviceRegistry::new();
        let (pad, state) = FakeDevice::new("pad", &[("ABS_X", ABS_X)]);
        let pad = registry.insert(Box::new(pad)).unwrap();

        let mut vars = Variables::new();
        define(&mut vars, &registry, "x", "pad.ABS_X");
        define(&mut vars, &registry, "double", "x * 2");
        define(&mut vars, &registry, "shifted", "double + x + 1");
        assert_eq!(vars.len(), 3);

        state.borrow_mut().values.insert(ABS_X, 0.25);
        vars.evaluate(&registry);
        let double = vars.find("double").unwrap();
        assert_eq!(vars.get(double), Some(0.5));
        assert_eq!(vars.values(), [Some(0.25), Some(0.5), Some(1.75)]);

        // one tick, one update
        state.borrow_mut().values.insert(ABS_X, -1.0);
        vars.evaluate(&registry);
        assert_eq!(vars.values(), [Some(-1.0), Some(-2.0), Some(-2.0)]);

        registry.remove(pad);
        vars.evaluate(&registry);
        assert_eq!(vars.values(), [None, None, None]);
    }

    #[test]
    fn forward_references() {
        let registry = DeviceRegistry::new();
        let mut vars = Variables::new();
        let err = Expr::parse(
            "later + 1",
            &Scope {
                registry: &registry,
                variables: &vars,
            },
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::UnknownVariable { name, .. } if name == "later"));

        define(&mut vars, &registry, "later", "1");
        let err = vars.define("later", Expr::Const(2.0)).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateVariable(name) if name == "later"));
    }
}
