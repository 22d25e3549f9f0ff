// ============================================================
// FEATURE SCHEMA
// ============================================================
// Ordered list of model inputs. Position in this list is the position
// in the feature vector sent to the prediction service.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::error::{AppError, Result};

pub const GROUP_HIV_ESTIMATES: &str = "HIV Estimates";
pub const GROUP_TB_OUTCOMES: &str = "TB Treatment Outcomes";
pub const GROUP_COINFECTION: &str = "HIV/TB Co-infection";
pub const GROUP_RETREATMENT: &str = "Retreatment & Drug Resistance";

const HIV_ESTIMATE_FIELDS: &[&str] = &[
    "Estimated number of people living with HIV_median",
    "Estimated number of people living with HIV_min",
    "Estimated number of people living with HIV_max",
    "Estimated ART coverage among people living with HIV (%)_median",
    "Estimated ART coverage among people living with HIV (%)_min",
    "Estimated ART coverage among people living with HIV (%)_max",
];

const TB_OUTCOME_FIELDS: &[&str] = &[
    "rep_meth",
    "new_sp_coh",
    "new_sp_cur",
    "new_sp_cmplt",
    "new_sp_died",
    "new_sp_fail",
    "new_sp_def",
    "c_new_sp_tsr",
    "new_snep_coh",
    "new_snep_cmplt",
    "new_snep_died",
    "new_snep_fail",
    "new_snep_def",
    "c_new_snep_tsr",
    "ret_coh",
    "ret_cur",
    "ret_cmplt",
    "ret_died",
    "ret_fail",
    "ret_def",
];

const COINFECTION_FIELDS: &[&str] = &[
    "hiv_new_sp_coh",
    "hiv_new_sp_cur",
    "hiv_new_sp_cmplt",
    "hiv_new_sp_died",
    "hiv_new_sp_fail",
    "hiv_new_sp_def",
    "hiv_new_snep_coh",
    "hiv_new_snep_cmplt",
    "hiv_new_snep_died",
    "hiv_new_snep_fail",
    "hiv_new_snep_def",
    "hiv_ret_coh",
    "hiv_ret_cur",
    "hiv_ret_cmplt",
    "hiv_ret_died",
    "hiv_ret_fail",
];

const RETREATMENT_FIELDS: &[&str] = &[
    "hiv_ret_def",
    "rel_with_new_flg",
    "newrel_coh",
    "newrel_succ",
    "newrel_fail",
    "newrel_died",
    "newrel_lost",
    "c_new_tsr",
    "ret_nrel_coh",
    "ret_nrel_succ",
    "ret_nrel_fail",
    "ret_nrel_died",
    "ret_nrel_lost",
    "c_ret_tsr",
    "tbhiv_coh",
    "tbhiv_succ",
    "tbhiv_fail",
    "tbhiv_died",
    "tbhiv_lost",
    "c_tbhiv_tsr",
    "mdr_coh",
    "mdr_succ",
    "mdr_fail",
    "mdr_died",
    "mdr_lost",
    "xdr_coh",
    "xdr_succ",
    "xdr_fail",
    "xdr_died",
    "xdr_lost",
];

/// A single expected input column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,

    /// Missing or blank values are an error when set
    pub required: bool,

    /// Form section the field is shown under
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,

    /// Value used for an absent optional field
    #[serde(default)]
    pub default_value: f64,
}

impl FieldSpec {
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: true,
            group: None,
            default_value: 0.0,
        }
    }

    pub fn optional(name: impl Into<String>, default_value: f64) -> Self {
        Self {
            name: name.into(),
            required: false,
            group: None,
            default_value,
        }
    }

    pub fn in_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureSchema {
    fields: Vec<FieldSpec>,
}

impl FeatureSchema {
    /// Build a schema, rejecting empty field lists and duplicate names.
    pub fn new(fields: Vec<FieldSpec>) -> Result<Self> {
        if fields.is_empty() {
            return Err(AppError::ConfigError(
                "feature schema must declare at least one field".to_string(),
            ));
        }

        let mut seen = HashSet::with_capacity(fields.len());
        for field in &fields {
            if field.name.trim().is_empty() {
                return Err(AppError::ConfigError(
                    "feature schema contains a field with an empty name".to_string(),
                ));
            }
            if !seen.insert(field.name.as_str()) {
                return Err(AppError::ConfigError(format!(
                    "duplicate field in feature schema: {}",
                    field.name
                )));
            }
            if !field.default_value.is_finite() {
                return Err(AppError::ConfigError(format!(
                    "default value for {} must be finite",
                    field.name
                )));
            }
        }

        Ok(Self { fields })
    }

    /// The 72 indicators the coverage model was trained on.
    pub fn tb_hiv() -> Result<Self> {
        let sections = [
            (GROUP_HIV_ESTIMATES, HIV_ESTIMATE_FIELDS),
            (GROUP_TB_OUTCOMES, TB_OUTCOME_FIELDS),
            (GROUP_COINFECTION, COINFECTION_FIELDS),
            (GROUP_RETREATMENT, RETREATMENT_FIELDS),
        ];

        let fields = sections
            .iter()
            .flat_map(|(group, names)| {
                names
                    .iter()
                    .map(move |name| FieldSpec::required(*name).in_group(*group))
            })
            .collect();

        Self::new(fields)
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Section names in first-appearance order
    pub fn groups(&self) -> Vec<&str> {
        let mut groups: Vec<&str> = Vec::new();
        for group in self.fields.iter().filter_map(|f| f.group.as_deref()) {
            if !groups.contains(&group) {
                groups.push(group);
            }
        }
        groups
    }

    pub fn fields_in_group<'a>(&'a self, group: &'a str) -> impl Iterator<Item = &'a FieldSpec> {
        self.fields
            .iter()
            .filter(move |f| f.group.as_deref() == Some(group))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tb_hiv_schema_shape() {
        let schema = FeatureSchema::tb_hiv().unwrap();
        assert_eq!(schema.len(), 72);
        assert_eq!(
            schema.fields()[0].name,
            "Estimated number of people living with HIV_median"
        );
        assert_eq!(schema.fields()[71].name, "xdr_lost");
        assert!(schema.fields().iter().all(|f| f.required));
    }

    #[test]
    fn test_groups_follow_form_sections() {
        let schema = FeatureSchema::tb_hiv().unwrap();
        assert_eq!(
            schema.groups(),
            vec![
                GROUP_HIV_ESTIMATES,
                GROUP_TB_OUTCOMES,
                GROUP_COINFECTION,
                GROUP_RETREATMENT
            ]
        );
        assert_eq!(schema.fields_in_group(GROUP_HIV_ESTIMATES).count(), 6);
        assert_eq!(schema.fields_in_group(GROUP_TB_OUTCOMES).count(), 20);
        assert_eq!(schema.fields_in_group(GROUP_COINFECTION).count(), 16);
        assert_eq!(schema.fields_in_group(GROUP_RETREATMENT).count(), 30);
    }

    #[test]
    fn test_rejects_duplicates() {
        let err = FeatureSchema::new(vec![FieldSpec::required("a"), FieldSpec::required("a")])
            .unwrap_err();
        assert!(matches!(err, AppError::ConfigError(_)));
    }

    #[test]
    fn test_rejects_empty_schema() {
        assert!(matches!(
            FeatureSchema::new(Vec::new()),
            Err(AppError::ConfigError(_))
        ));
    }

    #[test]
    fn test_index_of() {
        let schema =
            FeatureSchema::new(vec![FieldSpec::required("a"), FieldSpec::optional("b", 1.0)])
                .unwrap();
        assert_eq!(schema.index_of("b"), Some(1));
        assert_eq!(schema.index_of("c"), None);
    }
}
