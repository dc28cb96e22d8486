use crate::{
    analyzer::{LayoutField, ResultColumn, SpecLayout},
    dynamic::{DynamicSqlInfo, FragmentInfo, TableField},
};

/// Cuts the first query specification into select, FROM and WHERE fragments.
pub struct FragmentExtractor;

impl FragmentExtractor {
    pub fn extract(layout: &SpecLayout, columns: &[ResultColumn]) -> DynamicSqlInfo {
        let select = layout
            .items
            .iter()
            .map(|item| FragmentInfo {
                fields: item.fields.iter().map(|field| Self::table_field(field, layout, columns)).collect(),
                ..FragmentInfo::new(&item.text)
            })
            .collect();

        let from = layout
            .sources
            .iter()
            .enumerate()
            .map(|(index, source)| {
                let parent_relation = layout
                    .links
                    .iter()
                    .filter(|link| link.child == index)
                    .map(|link| link.parent)
                    .min()
                    .and_then(|parent| layout.sources.get(parent))
                    .map(|parent| parent.visible.clone());
                FragmentInfo {
                    fields: source.columns.iter().map(|(name, _)| TableField::new(name, &source.visible, name)).collect(),
                    relation: Some(source.visible.clone()),
                    parent_relation,
                    ..FragmentInfo::new(&source.fragment)
                }
            })
            .collect();

        let r#where = layout
            .conjuncts
            .iter()
            .map(|conjunct| FragmentInfo {
                fields: conjunct.fields.iter().map(|field| Self::table_field(field, layout, columns)).collect(),
                depend_on_params: conjunct.ordinals.clone(),
                ..FragmentInfo::new(&format!("AND {}", conjunct.text))
            })
            .collect();

        DynamicSqlInfo { select, from, r#where }
    }

    fn table_field(field: &LayoutField, layout: &SpecLayout, columns: &[ResultColumn]) -> TableField {
        let table = layout.sources.get(field.source).map(|s| s.visible.as_str()).unwrap_or_default();
        let name = field
            .output
            .and_then(|output| columns.get(output))
            .map(|column| column.name.as_str())
            .unwrap_or(&field.column);
        TableField::new(&field.column, table, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        analyzer::{JoinLink, LayoutConjunct, LayoutItem, LayoutSource},
        database::{ColumnKey, SqlType},
    };

    fn layout() -> SpecLayout {
        SpecLayout {
            sources: vec![
                LayoutSource {
                    visible: "u".into(),
                    table: "users".into(),
                    derived: false,
                    columns: vec![("id".into(), ColumnKey::Primary), ("name".into(), ColumnKey::None)],
                    fragment: "FROM users u".into(),
                },
                LayoutSource {
                    visible: "p".into(),
                    table: "posts".into(),
                    derived: false,
                    columns: vec![("id".into(), ColumnKey::Primary), ("fk_user".into(), ColumnKey::None)],
                    fragment: "LEFT JOIN posts p on p.fk_user = u.id".into(),
                },
            ],
            links: vec![JoinLink { child: 1, child_column: "fk_user".into(), parent: 0, parent_column: "id".into() }],
            items: vec![
                LayoutItem {
                    text: "u.id".into(),
                    columns: 0..1,
                    fields: vec![LayoutField { source: 0, column: "id".into(), output: Some(0) }],
                },
                LayoutItem {
                    text: "p.id as post_id".into(),
                    columns: 1..2,
                    fields: vec![LayoutField { source: 1, column: "id".into(), output: Some(1) }],
                },
            ],
            conjuncts: vec![LayoutConjunct {
                text: "u.name = ?".into(),
                fields: vec![LayoutField { source: 0, column: "name".into(), output: None }],
                ordinals: vec![0],
            }],
        }
    }

    #[test]
    pub fn test_extract_fragments() {
        let columns = vec![ResultColumn::new("id", SqlType::Int, true), ResultColumn::new("post_id", SqlType::Int, false)];
        let info = FragmentExtractor::extract(&layout(), &columns);

        assert_eq!(info.select.len(), 2);
        assert_eq!(info.select[1].fragment, "p.id as post_id");
        assert_eq!(info.select[1].fields, vec![TableField::new("id", "p", "post_id")]);

        assert_eq!(info.from[0].fragment, "FROM users u");
        assert_eq!(info.from[0].relation.as_deref(), Some("u"));
        assert_eq!(info.from[0].parent_relation, None);
        assert_eq!(info.from[1].parent_relation.as_deref(), Some("u"));
        assert_eq!(info.from[1].fields[1], TableField::new("fk_user", "p", "fk_user"));

        assert_eq!(info.r#where[0].fragment, "AND u.name = ?");
        assert_eq!(info.r#where[0].fields, vec![TableField::new("name", "u", "name")]);
        assert_eq!(info.r#where[0].depend_on_params, vec![0]);
    }
}
