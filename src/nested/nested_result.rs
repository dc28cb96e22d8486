use serde::Serialize;

/// How many child rows hang off one parent row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Cardinality {
    One,
    Many,
}

impl Cardinality {
    /// Cardinality of a path made of several hops.
    pub fn chain(self, other: Cardinality) -> Cardinality {
        match (self, other) {
            (Cardinality::One, Cardinality::One) => Cardinality::One,
            _ => Cardinality::Many,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RelationColumn {
    /// A result column read from the relation's table.
    Field { name: String, index: usize },
    /// A child relation joined to this one.
    Relation { name: String, cardinality: Cardinality },
}

impl RelationColumn {
    pub fn field(name: &str, index: usize) -> Self {
        RelationColumn::Field { name: name.to_string(), index }
    }

    pub fn relation(name: &str, cardinality: Cardinality) -> Self {
        RelationColumn::Relation { name: name.to_string(), cardinality }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationInfo {
    pub name: String,
    /// First result column contributed by the relation; rows are grouped on it.
    pub group_key_index: usize,
    pub columns: Vec<RelationColumn>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NestedResultInfo {
    pub relations: Vec<RelationInfo>,
}

impl NestedResultInfo {
    pub fn relation(&self, name: &str) -> Option<&RelationInfo> {
        self.relations.iter().find(|r| r.name == name)
    }
}
