use serde::Deserialize;
use serde_json::Value;

use crate::feature::{Attributes, Feature, is_present};
use crate::layer::Field;

/// Field-name override for one layer/alias pair whose schema alias does not
/// match the name the service actually fills.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AliasOverride {
    pub layer: String,
    pub alias: String,
    pub field: String,
}

impl AliasOverride {
    pub fn new(layer: &str, alias: &str, field: &str) -> Self {
        Self {
            layer: layer.to_string(),
            alias: alias.to_string(),
            field: field.to_string(),
        }
    }
}

/// Value of the field whose alias is exactly `alias`.
pub fn attr_by_alias<'a>(feature: &'a Feature, alias: &str) -> Option<&'a Value> {
    let schema = feature.layer.as_ref()?.fields.as_ref()?;
    let field = schema.by_alias(alias)?;
    feature.attributes.get(&field.name)
}

/// Alias lookup with fallbacks, for the locations list:
/// alias first, then a field literally named `alias`, then any
/// [`AliasOverride`] registered for `layer_title`. Only present values are
/// returned.
pub fn attr_by_alias_or_name<'a>(
    feature: &'a Feature,
    layer_title: &str,
    alias: &str,
    overrides: &[AliasOverride],
) -> Option<&'a Value> {
    let schema = feature.layer.as_ref()?.fields.as_ref()?;
    let mut field: Option<&Field> = schema.by_alias(alias).or_else(|| schema.by_name(alias));
    if let Some(o) = overrides
        .iter()
        .find(|o| o.layer == layer_title && o.alias == alias)
    {
        field = schema.by_name(&o.field);
    }
    let v = feature.attributes.get(&field?.name)?;
    is_present(v).then_some(v)
}

/// First present value among `names`, in order.
pub fn first_present<'a>(attrs: &'a Attributes, names: &[&str]) -> Option<&'a Value> {
    names
        .iter()
        .filter_map(|n| attrs.get(*n))
        .find(|v| is_present(v))
}

#[cfg(test)]
mod tests {
    use super::{AliasOverride, attr_by_alias, attr_by_alias_or_name, first_present};
    use crate::feature::Feature;
    use crate::layer::{Field, FieldSchema, LayerId, LayerInfo};
    use serde_json::json;
    use std::rc::Rc;

    fn feature(title: &str, fields: Vec<Field>, attrs: serde_json::Value) -> Feature {
        let info = Rc::new(LayerInfo {
            id: LayerId(1),
            title: title.to_string(),
            fields: Some(FieldSchema::new(fields)),
        });
        Feature::new(attrs.as_object().cloned().unwrap_or_default()).with_layer(info)
    }

    #[test]
    fn alias_lookup_uses_schema_alias() {
        let f = feature(
            "LITTER_KIT",
            vec![Field::new("SITE_ADDR", "Address")],
            json!({"SITE_ADDR": "405 Biltmore Way"}),
        );
        assert_eq!(attr_by_alias(&f, "Address"), Some(&json!("405 Biltmore Way")));
        assert_eq!(attr_by_alias(&f, "SITE_ADDR"), None);
    }

    #[test]
    fn lenient_lookup_falls_back_to_field_name() {
        let f = feature(
            "NEXTREX",
            vec![Field::new("Address", "Street")],
            json!({"Address": "1 Alhambra Cir"}),
        );
        assert_eq!(
            attr_by_alias_or_name(&f, "NEXTREX", "Address", &[]),
            Some(&json!("1 Alhambra Cir"))
        );
    }

    #[test]
    fn override_wins_for_its_layer_only() {
        let fields = vec![
            Field::new("Loc", "Location"),
            Field::new("Name", "Site name"),
        ];
        let attrs = json!({"Loc": "wrong", "Name": "War Memorial Youth Center"});
        let overrides = [AliasOverride::new("CLPR", "Location", "Name")];

        let clpr = feature("CLPR", fields.clone(), attrs.clone());
        assert_eq!(
            attr_by_alias_or_name(&clpr, "CLPR", "Location", &overrides),
            Some(&json!("War Memorial Youth Center"))
        );

        let other = feature("NEXTREX", fields, attrs);
        assert_eq!(
            attr_by_alias_or_name(&other, "NEXTREX", "Location", &overrides),
            Some(&json!("wrong"))
        );
    }

    #[test]
    fn empty_values_are_absent() {
        let f = feature("X", vec![Field::new("A", "Address")], json!({"A": ""}));
        assert_eq!(attr_by_alias_or_name(&f, "X", "Address", &[]), None);
    }

    #[test]
    fn first_present_respects_order() {
        let attrs = json!({"event_name": "Cleanup", "Name": "Other"});
        let attrs = attrs.as_object().unwrap();
        assert_eq!(
            first_present(attrs, &["EventName", "event_name", "Name"]),
            Some(&json!("Cleanup"))
        );
        assert_eq!(first_present(attrs, &["Missing"]), None);
    }
}
