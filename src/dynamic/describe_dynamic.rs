use indexmap::IndexSet;

use crate::dynamic::{DynamicSqlInfo, DynamicSqlInfoResult, FragmentInfo, FragmentInfoResult, TableField};

/// Resolve every fragment's dependencies to result column and parameter names.
///
/// `parameter_names` holds the display name of each placeholder ordinal.
pub fn describe_dynamic_query(info: &DynamicSqlInfo, parameter_names: &[String]) -> DynamicSqlInfoResult {
    let parameter_name =
        |ordinal: usize| parameter_names.get(ordinal).cloned().unwrap_or_else(|| format!("param{}", ordinal + 1));

    let select = info
        .select
        .iter()
        .map(|fragment| FragmentInfoResult {
            fragment: fragment.fragment.clone(),
            depend_on_fields: unique(fragment.fields.iter().map(|field| field.name.clone())),
            depend_on_params: vec![],
        })
        .collect();

    let selected: Vec<&TableField> = info.select.iter().flat_map(|fragment| &fragment.fields).collect();
    let from = with_child_fields(&info.from)
        .iter()
        .map(|fragment| {
            let filters: Vec<&FragmentInfo> = info
                .r#where
                .iter()
                .filter(|filter| filter.fields.iter().any(|read| fragment.fields.iter().any(|own| own.same_column(read))))
                .collect();
            if filters.iter().any(|filter| filter.depend_on_params.is_empty()) {
                return FragmentInfoResult { fragment: fragment.fragment.clone(), depend_on_fields: vec![], depend_on_params: vec![] };
            }

            FragmentInfoResult {
                fragment: fragment.fragment.clone(),
                depend_on_fields: unique(
                    fragment
                        .fields
                        .iter()
                        .filter_map(|own| selected.iter().find(|output| output.same_column(own)))
                        .map(|output| output.name.clone()),
                ),
                depend_on_params: unique(
                    filters
                        .iter()
                        .flat_map(|filter| filter.depend_on_params.iter().map(|ordinal| parameter_name(*ordinal))),
                ),
            }
        })
        .collect();

    let r#where = info
        .r#where
        .iter()
        .map(|fragment| FragmentInfoResult {
            fragment: fragment.fragment.clone(),
            depend_on_fields: vec![],
            depend_on_params: unique(fragment.depend_on_params.iter().map(|ordinal| parameter_name(*ordinal))),
        })
        .collect();

    DynamicSqlInfoResult { select, from, r#where }
}

/// Each FROM fragment also carries the fields of the fragments joined to it.
/// Fragments are visited in order, so a child absorbed before its own
/// children were added carries only its own fields up.
fn with_child_fields(from: &[FragmentInfo]) -> Vec<FragmentInfo> {
    let mut from = from.to_vec();
    for index in 0..from.len() {
        let Some(relation) = from[index].relation.clone() else {
            continue;
        };
        let children: Vec<TableField> = from
            .iter()
            .enumerate()
            .filter(|(other, fragment)| *other != index && fragment.parent_relation.as_deref() == Some(relation.as_str()))
            .flat_map(|(_, fragment)| fragment.fields.iter().cloned())
            .collect();
        from[index].fields.extend(children);
    }
    from
}

fn unique(values: impl Iterator<Item = String>) -> Vec<String> {
    values.collect::<IndexSet<String>>().into_iter().collect()
}
