use indexmap::IndexMap;
use tracing::debug;

use crate::{
    analyzer::{ResultColumn, SpecLayout},
    database::{ColumnKey, ForeignKey},
    nested::{Cardinality, NestedResultInfo, RelationColumn, RelationInfo},
};

/// Splits a flat SELECT result into the relation tree its joins describe.
pub struct NestedResultDecomposer;

impl NestedResultDecomposer {
    pub fn decompose(columns: &[ResultColumn], layout: &SpecLayout, foreign_keys: &[ForeignKey]) -> NestedResultInfo {
        // 1) sources that contribute columns, keyed by their first column
        let mut group_keys: IndexMap<usize, usize> = IndexMap::new();
        for (index, column) in columns.iter().enumerate() {
            if let Some(origin) = &column.origin {
                group_keys.entry(origin.source).or_insert(index);
            }
        }
        let mut ordered: Vec<(usize, usize)> = group_keys.iter().map(|(source, key)| (*source, *key)).collect();
        ordered.sort_by_key(|(source, key)| (*source != 0, *key));

        // 2) contributing parents of every relation
        let parents: IndexMap<usize, Vec<(usize, Cardinality)>> = ordered
            .iter()
            .map(|(source, _)| {
                let mut visited = vec![*source];
                (*source, Self::parents(*source, layout, foreign_keys, &group_keys, &mut visited))
            })
            .collect();

        // 3) fields in result order, child relations at their group key
        let relations: Vec<RelationInfo> = ordered
            .iter()
            .map(|(source, group_key)| {
                let mut entries: Vec<((usize, u8), RelationColumn)> = columns
                    .iter()
                    .enumerate()
                    .filter(|(_, column)| column.origin.as_ref().is_some_and(|o| o.source == *source))
                    .map(|(index, column)| ((index, 0), RelationColumn::field(&column.source_name, index)))
                    .collect();

                for (child, child_key) in &ordered {
                    let Some(cardinality) = parents
                        .get(child)
                        .and_then(|list| list.iter().find(|(parent, _)| parent == source))
                        .map(|(_, cardinality)| *cardinality)
                    else {
                        continue;
                    };
                    let position = if child_key > group_key { *child_key } else { usize::MAX };
                    entries.push(((position, 1), RelationColumn::relation(&Self::relation_name(*child, layout), cardinality)));
                }
                entries.sort_by_key(|(position, _)| *position);

                RelationInfo {
                    name: Self::relation_name(*source, layout),
                    group_key_index: *group_key,
                    columns: entries.into_iter().map(|(_, column)| column).collect(),
                }
            })
            .collect();

        debug!(relations = relations.len(), "nested result decomposed");
        NestedResultInfo { relations }
    }

    /// Parents of `source` that contribute columns. A parent contributing
    /// nothing is skipped in favour of its own parents.
    fn parents(
        source: usize,
        layout: &SpecLayout,
        foreign_keys: &[ForeignKey],
        group_keys: &IndexMap<usize, usize>,
        visited: &mut Vec<usize>,
    ) -> Vec<(usize, Cardinality)> {
        let mut found: Vec<(usize, Cardinality)> = Vec::new();
        for (parent, cardinality) in Self::hops(source, layout, foreign_keys) {
            if group_keys.contains_key(&parent) {
                Self::merge(&mut found, parent, cardinality);
                continue;
            }
            if visited.contains(&parent) {
                continue;
            }
            visited.push(parent);
            for (ancestor, above) in Self::parents(parent, layout, foreign_keys, group_keys, visited) {
                Self::merge(&mut found, ancestor, cardinality.chain(above));
            }
        }
        found
    }

    /// Direct parents of `source`: its join links, or else the first earlier
    /// table a foreign key connects it with.
    fn hops(source: usize, layout: &SpecLayout, foreign_keys: &[ForeignKey]) -> Vec<(usize, Cardinality)> {
        let Some(child) = layout.sources.get(source) else {
            return vec![];
        };

        let mut hops: Vec<(usize, Cardinality)> = Vec::new();
        for link in layout.links.iter().filter(|link| link.child == source) {
            let cardinality = match child.column_key(&link.child_column) {
                ColumnKey::Primary | ColumnKey::Unique => Cardinality::One,
                _ => Cardinality::Many,
            };
            Self::merge(&mut hops, link.parent, cardinality);
        }
        if !hops.is_empty() || child.derived {
            return hops;
        }

        let fallback = layout.sources[..source]
            .iter()
            .enumerate()
            .find(|(_, parent)| !parent.derived && foreign_keys.iter().any(|fk| fk.links(&parent.table, &child.table)));
        if let Some((parent_index, parent)) = fallback {
            let parent_holds_key = foreign_keys
                .iter()
                .any(|fk| fk.table.eq_ignore_ascii_case(&parent.table) && fk.ref_table.eq_ignore_ascii_case(&child.table));
            let cardinality = if parent_holds_key { Cardinality::One } else { Cardinality::Many };
            hops.push((parent_index, cardinality));
        }
        hops
    }

    /// Record `parent` once; a `one` path wins over a `many` one.
    fn merge(found: &mut Vec<(usize, Cardinality)>, parent: usize, cardinality: Cardinality) {
        match found.iter_mut().find(|(known, _)| *known == parent) {
            Some((_, known)) if cardinality == Cardinality::One => *known = Cardinality::One,
            Some(_) => {}
            None => found.push((parent, cardinality)),
        }
    }

    /// Table name, or the alias when the table appears more than once.
    fn relation_name(source: usize, layout: &SpecLayout) -> String {
        let Some(current) = layout.sources.get(source) else {
            return String::new();
        };
        let repeated = layout
            .sources
            .iter()
            .filter(|other| other.table.eq_ignore_ascii_case(&current.table))
            .count()
            > 1;
        match current.derived || repeated {
            true => current.visible.clone(),
            false => current.table.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        analyzer::{ColumnOrigin, JoinLink, LayoutSource},
        database::SqlType,
    };

    fn source(table: &str, visible: &str, columns: &[(&str, ColumnKey)]) -> LayoutSource {
        LayoutSource {
            visible: visible.to_string(),
            table: table.to_string(),
            derived: false,
            columns: columns.iter().map(|(name, key)| (name.to_string(), *key)).collect(),
            fragment: String::new(),
        }
    }

    fn column(name: &str, source: usize, layout: &SpecLayout) -> ResultColumn {
        let mut column = ResultColumn::new(name, SqlType::Int, true);
        column.origin = Some(ColumnOrigin {
            source,
            table: layout.sources[source].table.clone(),
            visible: layout.sources[source].visible.clone(),
            column: name.to_string(),
        });
        column
    }

    fn link(child: usize, child_column: &str, parent: usize, parent_column: &str) -> JoinLink {
        JoinLink {
            child,
            child_column: child_column.to_string(),
            parent,
            parent_column: parent_column.to_string(),
        }
    }

    #[test]
    pub fn test_one_to_many_by_join_condition() {
        let layout = SpecLayout {
            sources: vec![
                source("users", "u", &[("id", ColumnKey::Primary), ("name", ColumnKey::None)]),
                source("posts", "p", &[("id", ColumnKey::Primary), ("fk_user", ColumnKey::None)]),
            ],
            links: vec![link(1, "fk_user", 0, "id")],
            ..Default::default()
        };
        let columns = vec![column("id", 0, &layout), column("name", 0, &layout), column("id", 1, &layout)];

        let info = NestedResultDecomposer::decompose(&columns, &layout, &[]);
        assert_eq!(info.relations.len(), 2);
        assert_eq!(
            info.relations[0],
            RelationInfo {
                name: "users".into(),
                group_key_index: 0,
                columns: vec![
                    RelationColumn::field("id", 0),
                    RelationColumn::field("name", 1),
                    RelationColumn::relation("posts", Cardinality::Many),
                ],
            }
        );
        assert_eq!(info.relations[1].group_key_index, 2);
        assert_eq!(info.relations[1].columns, vec![RelationColumn::field("id", 2)]);
    }

    #[test]
    pub fn test_silent_parent_is_climbed_over() {
        // users -> posts (many) -> comments (many); posts selects nothing
        let layout = SpecLayout {
            sources: vec![
                source("users", "u", &[("id", ColumnKey::Primary)]),
                source("posts", "p", &[("id", ColumnKey::Primary), ("fk_user", ColumnKey::None)]),
                source("comments", "c", &[("id", ColumnKey::Primary), ("fk_post", ColumnKey::None)]),
            ],
            links: vec![link(1, "fk_user", 0, "id"), link(2, "fk_post", 1, "id")],
            ..Default::default()
        };
        let columns = vec![column("id", 0, &layout), column("id", 2, &layout)];

        let info = NestedResultDecomposer::decompose(&columns, &layout, &[]);
        let names: Vec<&str> = info.relations.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["users", "comments"]);
        assert_eq!(info.relations[0].columns[1], RelationColumn::relation("comments", Cardinality::Many));
    }

    #[test]
    pub fn test_foreign_key_fallback() {
        // posts joined to users without a usable condition
        let layout = SpecLayout {
            sources: vec![
                source("posts", "posts", &[("id", ColumnKey::Primary), ("fk_user", ColumnKey::None)]),
                source("users", "users", &[("id", ColumnKey::Primary)]),
            ],
            ..Default::default()
        };
        let foreign_keys = vec![ForeignKey::new("posts", "fk_user", "users", "id")];
        let columns = vec![column("id", 0, &layout), column("id", 1, &layout)];

        let info = NestedResultDecomposer::decompose(&columns, &layout, &foreign_keys);
        assert_eq!(info.relations[0].columns[1], RelationColumn::relation("users", Cardinality::One));

        let info = NestedResultDecomposer::decompose(&columns, &layout, &[]);
        assert_eq!(info.relations[0].columns, vec![RelationColumn::field("id", 0)]);
    }

    #[test]
    pub fn test_repeated_table_uses_alias() {
        let layout = SpecLayout {
            sources: vec![
                source("users", "author", &[("id", ColumnKey::Primary), ("fk_manager", ColumnKey::None)]),
                source("users", "manager", &[("id", ColumnKey::Primary), ("fk_manager", ColumnKey::None)]),
            ],
            links: vec![link(1, "id", 0, "fk_manager")],
            ..Default::default()
        };
        let columns = vec![column("id", 0, &layout), column("id", 1, &layout)];

        let info = NestedResultDecomposer::decompose(&columns, &layout, &[]);
        assert_eq!(info.relations[0].name, "author");
        assert_eq!(info.relations[0].columns[1], RelationColumn::relation("manager", Cardinality::One));
        assert!(info.relation("manager").is_some());
    }
}
