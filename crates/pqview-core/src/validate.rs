//! The type validator.

use pqview_model::{CoercionPolicy, Column, ColumnType, ValidationError, Value};

use crate::error::EditError;

/// Gatekeeper for every value written into a table.
///
/// A value is accepted as-is when it conforms to the column, otherwise it is
/// converted under the coercion whitelist or rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Validator {
    policy: CoercionPolicy,
}

impl Validator {
    pub fn new(policy: CoercionPolicy) -> Self {
        Self { policy }
    }

    /// A validator that only accepts exact type matches.
    pub fn strict() -> Self {
        Self::new(CoercionPolicy::none())
    }

    pub fn policy(&self) -> &CoercionPolicy {
        &self.policy
    }

    pub fn set_policy(&mut self, policy: CoercionPolicy) {
        self.policy = policy;
    }

    /// Returns the value to store, possibly converted.
    pub fn validate(&self, value: Value, column: &Column) -> Result<Value, ValidationError> {
        let accepted = match value {
            Value::Null => Value::Null,
            v if v.column_type() == column.column_type() => v,
            v => self
                .policy
                .coerce(&v, column.column_type())
                .map_err(|reason| {
                    ValidationError::mismatch(
                        column.name(),
                        column.column_type(),
                        v.column_type(),
                        reason,
                    )
                })?,
        };
        if accepted.is_null() && !column.is_nullable() {
            return Err(ValidationError::null_not_allowed(column.name()));
        }
        Ok(accepted)
    }

    /// Validate one value per column, in order.
    pub fn validate_row(
        &self,
        values: Vec<Value>,
        columns: &[Column],
    ) -> Result<Vec<Value>, ValidationError> {
        values
            .into_iter()
            .zip(columns)
            .map(|(value, column)| self.validate(value, column))
            .collect()
    }

    /// Convert every value of a column to `target`, or reject the whole retype.
    pub fn validate_retype(
        &self,
        column: &Column,
        values: &[Value],
        target: ColumnType,
    ) -> Result<Vec<Value>, EditError> {
        let retyped = column.with_type(target);
        values
            .iter()
            .enumerate()
            .map(|(row, value)| {
                self.validate(value.clone(), &retyped).map_err(|err| {
                    EditError::rejected(
                        format!(
                            "cannot convert row {row} of '{}' to {target}",
                            column.name()
                        ),
                        err,
                    )
                })
            })
            .collect()
    }
}
