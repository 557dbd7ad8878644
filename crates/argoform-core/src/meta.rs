//! ObjectMeta construction helpers

use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use std::collections::BTreeMap;

/// Label naming the application an object belongs to
pub const APP_NAME_LABEL: &str = "app.kubernetes.io/name";

/// Label identifying the ArgoCD instance managing a namespace
pub const ARGOCD_MANAGED_BY_LABEL: &str = "argocd.argoproj.io/managed-by";

/// Annotation recording the repository an object was generated from
pub const VCS_URI_ANNOTATION: &str = "app.openshift.io/vcs-uri";

/// Metadata for a cluster-scoped object
pub fn object_meta(name: impl Into<String>) -> ObjectMeta {
    ObjectMeta {
        name: Some(name.into()),
        ..Default::default()
    }
}

/// Metadata for a namespaced object
pub fn namespaced(namespace: impl Into<String>, name: impl Into<String>) -> ObjectMeta {
    ObjectMeta {
        name: Some(name.into()),
        namespace: Some(namespace.into()),
        ..Default::default()
    }
}

/// Merge labels into the metadata
pub fn add_labels<I, K, V>(meta: &mut ObjectMeta, labels: I)
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    let existing = meta.labels.get_or_insert_with(BTreeMap::new);
    for (k, v) in labels {
        existing.insert(k.into(), v.into());
    }
}

/// Merge annotations into the metadata
pub fn add_annotations<I, K, V>(meta: &mut ObjectMeta, annotations: I)
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    let existing = meta.annotations.get_or_insert_with(BTreeMap::new);
    for (k, v) in annotations {
        existing.insert(k.into(), v.into());
    }
}
