//! Query-by-example filters.
//!
//! A [`Filter`] is the conjunction of `expr = ?` clauses taken from the
//! non-zero queryable fields of an example entity. The empty conjunction is
//! rendered like any other, so a filter with no clauses matches every row
//! without a separate code path.

use crate::descriptor::{Entity, FieldValue};

/// One equality constraint.
#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
    pub expr: &'static str,
    pub value: FieldValue,
}

/// Conjunction of equality constraints against one entity's source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    clauses: Vec<Clause>,
}

impl Filter {
    /// The empty conjunction.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn from_example<E: Entity>(example: &E) -> Self {
        let clauses = E::descriptor()
            .fields
            .iter()
            .zip(example.values())
            .filter(|(field, value)| field.constrains(value))
            .map(|(field, value)| Clause {
                expr: field.expr,
                value,
            })
            .collect();

        Self { clauses }
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// WHERE-clause body, one placeholder per clause in `binds()` order.
    pub fn predicate(&self) -> String {
        std::iter::once("1".to_string())
            .chain(self.clauses.iter().map(|c| format!("{} = ?", c.expr)))
            .collect::<Vec<_>>()
            .join(" AND ")
    }

    pub fn binds(&self) -> impl Iterator<Item = &FieldValue> {
        self.clauses.iter().map(|c| &c.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Album, Song};

    #[test]
    fn test_zero_example_is_the_empty_conjunction() {
        let filter = Filter::from_example(&Album::default());
        assert!(filter.is_empty());
        assert_eq!(filter, Filter::all());
        assert_eq!(filter.predicate(), "1");
    }

    #[test]
    fn test_non_zero_fields_constrain_in_field_order() {
        let example = Album {
            title: "III".to_string(),
            num_disks: 1,
            ..Default::default()
        };
        let filter = Filter::from_example(&example);
        assert_eq!(filter.predicate(), "1 AND title = ? AND num_disks = ?");
        let binds: Vec<_> = filter.binds().cloned().collect();
        assert_eq!(binds, vec![FieldValue::from("III"), FieldValue::Integer(1)]);
    }

    #[test]
    fn test_unqueryable_field_is_ignored() {
        let example = Song {
            duration: 1993.0,
            ..Default::default()
        };
        assert!(Filter::from_example(&example).is_empty());
    }

    #[test]
    fn test_derived_and_nullable_fields() {
        let example = Song {
            artist: "Megadeth".to_string(),
            track: Some(0),
            ..Default::default()
        };
        let filter = Filter::from_example(&example);
        assert_eq!(filter.predicate(), "1 AND s.track = ? AND ar.name = ?");
    }
}
