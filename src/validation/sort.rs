//! Allow-lists for dynamic sort strings.
//!
//! A sortable type describes its declared fields once, as a static
//! [`FieldSchema`]. The allow-list is the set of dotted paths reachable from
//! the root, built breadth-first: leaf columns become sortable paths, nested
//! structures are queued with their path as prefix, and collections are
//! listed nowhere because a row cannot be ordered by a list.

use std::collections::{BTreeMap, VecDeque};

use crate::types::SortDirection;

/// Declared fields of one structure
#[derive(Debug)]
pub struct FieldSchema {
    pub name: &'static str,
    pub fields: &'static [Field],
}

#[derive(Debug)]
pub struct Field {
    pub name: &'static str,
    pub kind: FieldKind,
}

#[derive(Debug)]
pub enum FieldKind {
    /// Scalar stored in `column` of the current table alias
    Column(&'static str),
    /// Structure whose columns live in the parent row
    Embedded(&'static FieldSchema),
    /// Structure reached through a join under its own table alias
    Joined {
        schema: &'static FieldSchema,
        alias: &'static str,
    },
    /// One-to-many values; never traversed
    Collection,
}

impl Field {
    pub const fn column(name: &'static str, column: &'static str) -> Self {
        Self { name, kind: FieldKind::Column(column) }
    }

    pub const fn embedded(name: &'static str, schema: &'static FieldSchema) -> Self {
        Self { name, kind: FieldKind::Embedded(schema) }
    }

    pub const fn joined(name: &'static str, schema: &'static FieldSchema, alias: &'static str) -> Self {
        Self { name, kind: FieldKind::Joined { schema, alias } }
    }

    pub const fn collection(name: &'static str) -> Self {
        Self { name, kind: FieldKind::Collection }
    }
}

/// Types that can be ordered by a client-supplied field path
pub trait Sortable {
    /// Table alias the root columns are qualified with
    const TABLE_ALIAS: &'static str;

    fn schema() -> &'static FieldSchema;

    /// Cached allow-list, built once per type
    fn sort_fields() -> &'static SortFields;
}

/// A resolved, validated ordering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortOrder {
    /// Dotted field path as seen by clients, e.g. `dateAudit.createdAt`
    pub path: String,
    /// Qualified SQL column, e.g. `d.created_at`
    pub column: String,
    pub direction: SortDirection,
}

impl SortOrder {
    pub fn to_sql(&self) -> String {
        format!("{} {}", self.column, self.direction.to_sql())
    }
}

struct Pending {
    schema: &'static FieldSchema,
    prefix: String,
    alias: &'static str,
    ancestors: Vec<&'static str>,
}

/// Sortable paths of one root type mapped to their SQL columns
#[derive(Debug, Clone)]
pub struct SortFields {
    fields: BTreeMap<String, String>,
}

impl SortFields {
    pub fn build(root: &'static FieldSchema, root_alias: &'static str) -> Self {
        let mut fields = BTreeMap::new();
        let mut queue = VecDeque::new();
        queue.push_back(Pending {
            schema: root,
            prefix: String::new(),
            alias: root_alias,
            ancestors: vec![root.name],
        });

        while let Some(pending) = queue.pop_front() {
            for field in pending.schema.fields {
                let path = if pending.prefix.is_empty() {
                    field.name.to_string()
                } else {
                    format!("{}.{}", pending.prefix, field.name)
                };

                let (schema, alias) = match &field.kind {
                    FieldKind::Column(column) => {
                        fields.insert(path, format!("{}.{}", pending.alias, column));
                        continue;
                    }
                    FieldKind::Collection => continue,
                    FieldKind::Embedded(schema) => (*schema, pending.alias),
                    FieldKind::Joined { schema, alias } => (*schema, *alias),
                };

                // A structure already on this branch would recurse forever
                if pending.ancestors.contains(&schema.name) {
                    continue;
                }

                let mut ancestors = pending.ancestors.clone();
                ancestors.push(schema.name);
                queue.push_back(Pending { schema, prefix: path, alias, ancestors });
            }
        }

        Self { fields }
    }

    pub fn contains(&self, path: &str) -> bool {
        self.fields.contains_key(path)
    }

    pub fn column(&self, path: &str) -> Option<&str> {
        self.fields.get(path).map(String::as_str)
    }

    /// Sorted list of accepted paths
    pub fn paths(&self) -> Vec<&str> {
        self.fields.keys().map(String::as_str).collect()
    }

    /// Validate a sort string such as `itemName`, `dateAudit.createdAt.desc`.
    ///
    /// A trailing `.asc`/`.desc` is taken as the direction unless `explicit`
    /// is given.
    pub fn check(&self, value: &str, explicit: Option<SortDirection>) -> Result<SortOrder, String> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err("Sort field must not be empty".to_string());
        }

        let (path, suffix) = if let Some(path) = trimmed.strip_suffix(".asc") {
            (path, Some(SortDirection::Asc))
        } else if let Some(path) = trimmed.strip_suffix(".desc") {
            (path, Some(SortDirection::Desc))
        } else {
            (trimmed, None)
        };

        match self.column(path) {
            Some(column) => Ok(SortOrder {
                path: path.to_string(),
                column: column.to_string(),
                direction: explicit.or(suffix).unwrap_or_default(),
            }),
            None => Err(format!(
                "Invalid sort field: '{}'. Valid fields are: {}",
                trimmed,
                self.paths().join(", ")
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static AUDIT: FieldSchema = FieldSchema {
        name: "Audit",
        fields: &[Field::column("createdAt", "created_at")],
    };

    static OWNER: FieldSchema = FieldSchema {
        name: "Owner",
        fields: &[
            Field::column("name", "name"),
            Field::joined("pet", &PET, "p2"),
        ],
    };

    static PET: FieldSchema = FieldSchema {
        name: "Pet",
        fields: &[
            Field::column("id", "id"),
            Field::embedded("audit", &AUDIT),
            Field::joined("owner", &OWNER, "o"),
            Field::collection("toys"),
        ],
    };

    fn pet_fields() -> SortFields {
        SortFields::build(&PET, "p")
    }

    #[test]
    fn collects_nested_paths_breadth_first() {
        let fields = pet_fields();
        assert_eq!(
            fields.paths(),
            vec!["audit.createdAt", "id", "owner.name"]
        );
        assert_eq!(fields.column("audit.createdAt"), Some("p.created_at"));
        assert_eq!(fields.column("owner.name"), Some("o.name"));
    }

    #[test]
    fn does_not_reenter_structures_on_the_same_branch() {
        let fields = pet_fields();
        assert!(!fields.contains("owner.pet.id"));
        assert!(!fields.contains("toys"));
    }

    #[test]
    fn strips_direction_suffix() {
        let order = pet_fields().check(" audit.createdAt.desc ", None).unwrap();
        assert_eq!(order.path, "audit.createdAt");
        assert_eq!(order.direction, SortDirection::Desc);
        assert_eq!(order.to_sql(), "p.created_at DESC");
    }

    #[test]
    fn explicit_direction_wins_over_suffix() {
        let order = pet_fields().check("id.desc", Some(SortDirection::Asc)).unwrap();
        assert_eq!(order.direction, SortDirection::Asc);
    }

    #[test]
    fn rejects_unknown_and_empty_fields() {
        let err = pet_fields().check("weight", None).unwrap_err();
        assert_eq!(
            err,
            "Invalid sort field: 'weight'. Valid fields are: audit.createdAt, id, owner.name"
        );
        assert!(pet_fields().check("   ", None).is_err());
    }
}
