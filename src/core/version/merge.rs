// ─── Inheritance Merge ───
// Layers a child manifest (e.g. a loader profile) over its parent.
//
// Scalars: child wins, parent fills empties.
// Libraries: dedup on (group, artifact, classifier); child wins, but native
// mappings and classifier downloads only the parent declares are added.
// Arguments: child entries first, then parent entries.

use std::collections::HashMap;

use crate::core::maven::{library_key, LibraryKey};

use super::version_file::{Arguments, LibraryEntry, VersionJson};

/// Merge `child` onto an already-resolved `parent`.
pub fn merge_with_parent(child: VersionJson, parent: &VersionJson) -> VersionJson {
    let mut merged = child;

    // A child without its own client archive runs on the parent's.
    if is_blank(&merged.jar) && merged.client_download().is_none() {
        merged.jar = Some(parent.jar_id().to_string());
    }

    if merged
        .asset_index
        .as_ref()
        .map_or(true, |ai| ai.id.is_empty())
    {
        merged.asset_index = parent.asset_index.clone();
    }
    if merged.client_download().is_none() {
        merged.downloads = parent.downloads.clone();
    }
    inherit_string(&mut merged.assets, &parent.assets);
    inherit_string(&mut merged.version_type, &parent.version_type);
    inherit_string(&mut merged.main_class, &parent.main_class);
    inherit_string(&mut merged.minecraft_arguments, &parent.minecraft_arguments);
    if merged.java_version.is_none() {
        merged.java_version = parent.java_version.clone();
    }

    merged.libraries = merge_libraries(
        std::mem::take(&mut merged.libraries),
        &parent.libraries,
    );
    merged.arguments = merge_arguments(merged.arguments.take(), parent.arguments.as_ref());

    merged
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, str::is_empty)
}

fn inherit_string(slot: &mut Option<String>, parent: &Option<String>) {
    if is_blank(slot) && !is_blank(parent) {
        *slot = parent.clone();
    }
}

fn merge_arguments(child: Option<Arguments>, parent: Option<&Arguments>) -> Option<Arguments> {
    match (child, parent) {
        (None, None) => None,
        (Some(child), None) => Some(child),
        (None, Some(parent)) => Some(parent.clone()),
        (Some(mut child), Some(parent)) => {
            child.game.extend(parent.game.iter().cloned());
            child.jvm.extend(parent.jvm.iter().cloned());
            Some(child)
        }
    }
}

/// Child entries keep their order and win on key collisions; parent-only
/// entries follow in parent order.
pub fn merge_libraries(child: Vec<LibraryEntry>, parent: &[LibraryEntry]) -> Vec<LibraryEntry> {
    let mut seen: HashMap<LibraryKey, usize> = HashMap::new();
    let mut result: Vec<LibraryEntry> = Vec::with_capacity(child.len() + parent.len());

    for lib in child {
        let key = library_key(&lib.name);
        if !seen.contains_key(&key) {
            seen.insert(key, result.len());
            result.push(lib);
        }
    }

    for lib in parent {
        let key = library_key(&lib.name);
        match seen.get(&key) {
            None => {
                seen.insert(key, result.len());
                result.push(lib.clone());
            }
            Some(&idx) => absorb_natives(&mut result[idx], lib),
        }
    }

    result
}

fn absorb_natives(survivor: &mut LibraryEntry, parent: &LibraryEntry) {
    for (os, classifier) in &parent.natives {
        survivor
            .natives
            .entry(os.clone())
            .or_insert_with(|| classifier.clone());
    }

    let Some(parent_classifiers) = parent
        .downloads
        .as_ref()
        .map(|d| &d.classifiers)
        .filter(|c| !c.is_empty())
    else {
        return;
    };

    let downloads = survivor.downloads.get_or_insert_with(Default::default);
    for (name, artifact) in parent_classifiers {
        downloads
            .classifiers
            .entry(name.clone())
            .or_insert_with(|| artifact.clone());
    }
}
