use crate::csv_processor::load_translation_map;
use crate::utils::{L10nError, Result};
use crate::xml_patch::XmlPatcher;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub const DEF_INJECTED_DIR: &str = "DefInjected";
/// Misspelled name some mods ship with; accepted as-is.
pub const DEF_INJURED_DIR: &str = "DefInjured";
pub const KEYED_DIR: &str = "Keyed";
pub const DEFAULT_LANGUAGE: &str = "ChineseSimplified";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageLayout {
    pub language_dir: PathBuf,
    pub def_injected: PathBuf,
    pub keyed: PathBuf,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatchReport {
    pub files_scanned: usize,
    pub files_changed: usize,
    pub files_failed: usize,
}

impl LanguageLayout {
    pub fn resolve(mod_root: &Path, language: &str) -> Result<Self> {
        let language_dir = mod_root.join("Languages").join(language);

        let def_injected = [DEF_INJECTED_DIR, DEF_INJURED_DIR]
            .iter()
            .map(|name| language_dir.join(name))
            .find(|dir| dir.is_dir())
            .ok_or_else(|| {
                L10nError::DirectoryNotFound(format!(
                    "no {} or {} directory under {}",
                    DEF_INJECTED_DIR,
                    DEF_INJURED_DIR,
                    language_dir.display()
                ))
            })?;

        Ok(Self {
            keyed: language_dir.join(KEYED_DIR),
            language_dir,
            def_injected,
        })
    }

    /// Every `*.xml` under `DefInjected` (or `DefInjured`) followed by every
    /// one under `Keyed`.
    pub fn xml_files(&self) -> Vec<PathBuf> {
        let mut files = collect_xml_files(&self.def_injected);
        if self.keyed.is_dir() {
            files.extend(collect_xml_files(&self.keyed));
        } else {
            tracing::warn!(dir = %self.keyed.display(), "Keyed directory not found, skipping");
        }
        files
    }
}

pub fn collect_xml_files(root: &Path) -> Vec<PathBuf> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!(error = %e, "Skipping unreadable directory entry");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(walkdir::DirEntry::into_path)
        .filter(|path| path.extension().is_some_and(|ext| ext == "xml"))
        .collect()
}

/// Loads the translation map from `csv_path` and patches every XML file of
/// the mod's language folder with it.
///
/// Input errors (CSV or directory) abort the run. A file that fails to parse
/// is logged and skipped.
pub fn patch_mod(
    csv_path: &Path,
    mod_root: &Path,
    language: &str,
    patcher: &dyn XmlPatcher,
) -> Result<PatchReport> {
    let map = load_translation_map(csv_path).inspect_err(|e| {
        tracing::error!(path = %csv_path.display(), error = %e, "Could not load translation CSV");
    })?;

    let layout = LanguageLayout::resolve(mod_root, language).inspect_err(|e| {
        tracing::error!(error = %e, "Could not locate translation folders");
    })?;

    tracing::info!(
        strategy = patcher.name(),
        entries = map.len(),
        dir = %layout.language_dir.display(),
        "Patching XML files"
    );

    let mut report = PatchReport::default();
    for path in layout.xml_files() {
        report.files_scanned += 1;
        match patcher.patch(&path, &map) {
            Ok(true) => report.files_changed += 1,
            Ok(false) => {}
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "Could not patch XML file");
                report.files_failed += 1;
            }
        }
    }

    tracing::info!(
        scanned = report.files_scanned,
        changed = report.files_changed,
        failed = report.files_failed,
        "Patch finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml_patch::{PreservingPatcher, StrictPatcher};
    use std::fs;

    struct ModTree {
        _dir: tempfile::TempDir,
        root: PathBuf,
        lang: PathBuf,
    }

    fn mod_tree(def_dir: Option<&str>, keyed: bool) -> ModTree {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_path_buf();
        let lang = root.join("Languages").join(DEFAULT_LANGUAGE);
        fs::create_dir_all(&lang).unwrap();
        if let Some(name) = def_dir {
            fs::create_dir_all(lang.join(name).join("ThingDef")).unwrap();
        }
        if keyed {
            fs::create_dir_all(lang.join(KEYED_DIR)).unwrap();
        }
        ModTree {
            _dir: dir,
            root,
            lang,
        }
    }

    #[test]
    fn prefers_def_injected() {
        let tree = mod_tree(Some(DEF_INJECTED_DIR), true);
        fs::create_dir_all(tree.lang.join(DEF_INJURED_DIR)).unwrap();

        let layout = LanguageLayout::resolve(&tree.root, DEFAULT_LANGUAGE).unwrap();

        assert_eq!(layout.def_injected, tree.lang.join(DEF_INJECTED_DIR));
        assert_eq!(layout.keyed, tree.lang.join(KEYED_DIR));
    }

    #[test]
    fn falls_back_to_misspelled_def_injured() {
        let tree = mod_tree(Some(DEF_INJURED_DIR), false);

        let layout = LanguageLayout::resolve(&tree.root, DEFAULT_LANGUAGE).unwrap();

        assert_eq!(layout.def_injected, tree.lang.join(DEF_INJURED_DIR));
    }

    #[test]
    fn no_definition_folder_is_an_error() {
        let tree = mod_tree(Some("DefInject"), true);

        let err = LanguageLayout::resolve(&tree.root, DEFAULT_LANGUAGE).unwrap_err();

        assert!(matches!(err, L10nError::DirectoryNotFound(_)));
    }

    #[test]
    fn collects_xml_recursively_from_both_folders() {
        let tree = mod_tree(Some(DEF_INJECTED_DIR), true);
        let def = tree.lang.join(DEF_INJECTED_DIR);
        fs::write(def.join("ThingDef").join("Weapons.xml"), "<LanguageData/>").unwrap();
        fs::write(def.join("notes.txt"), "x").unwrap();
        fs::write(def.join("Upper.XML"), "<LanguageData/>").unwrap();
        fs::create_dir_all(def.join("folder.xml")).unwrap();
        fs::write(tree.lang.join(KEYED_DIR).join("Keys.xml"), "<LanguageData/>").unwrap();

        let layout = LanguageLayout::resolve(&tree.root, DEFAULT_LANGUAGE).unwrap();
        let files = layout.xml_files();

        assert_eq!(
            files,
            vec![
                def.join("ThingDef").join("Weapons.xml"),
                tree.lang.join(KEYED_DIR).join("Keys.xml"),
            ]
        );
    }

    #[test]
    fn missing_keyed_folder_is_skipped() {
        let tree = mod_tree(Some(DEF_INJECTED_DIR), false);
        let def = tree.lang.join(DEF_INJECTED_DIR);
        fs::write(def.join("A.xml"), "<LanguageData/>").unwrap();

        let layout = LanguageLayout::resolve(&tree.root, DEFAULT_LANGUAGE).unwrap();

        assert_eq!(layout.xml_files(), vec![def.join("A.xml")]);
    }

    #[test]
    fn patch_mod_updates_matching_files_and_skips_broken_ones() {
        let tree = mod_tree(Some(DEF_INJURED_DIR), true);
        let def = tree.lang.join(DEF_INJURED_DIR);
        let keyed = tree.lang.join(KEYED_DIR);
        let weapons = def.join("ThingDef").join("Weapons.xml");
        let broken = def.join("Broken.xml");
        let untouched = keyed.join("Other.xml");
        let keys = keyed.join("Keys.xml");

        fs::write(
            &weapons,
            "<LanguageData>\n  <Gun.label>gun</Gun.label>\n  <Gun.description>desc</Gun.description>\n</LanguageData>\n",
        )
        .unwrap();
        fs::write(&broken, "<LanguageData><Gun.label>x</LanguageData>").unwrap();
        fs::write(&untouched, "<LanguageData>\n  <Unrelated>keep</Unrelated>\n</LanguageData>\n").unwrap();
        fs::write(&keys, "<LanguageData>\n  <CommandFire>Fire</CommandFire>\n</LanguageData>\n").unwrap();

        let csv_path = tree.root.join("translations.csv");
        fs::write(
            &csv_path,
            "key,text,translated\nThingDef/Gun.label,gun,枪\nCommandFire,Fire,开火\n",
        )
        .unwrap();

        let report = patch_mod(&csv_path, &tree.root, DEFAULT_LANGUAGE, &PreservingPatcher).unwrap();

        assert_eq!(
            report,
            PatchReport {
                files_scanned: 4,
                files_changed: 2,
                files_failed: 1,
            }
        );
        assert_eq!(
            fs::read_to_string(&weapons).unwrap(),
            "<?xml version='1.0' encoding='utf-8'?>\n<LanguageData>\n  <Gun.label>枪</Gun.label>\n  <Gun.description>desc</Gun.description>\n</LanguageData>\n"
        );
        assert!(fs::read_to_string(&keys).unwrap().contains("<CommandFire>开火</CommandFire>"));
        assert_eq!(
            fs::read_to_string(&untouched).unwrap(),
            "<LanguageData>\n  <Unrelated>keep</Unrelated>\n</LanguageData>\n"
        );
        assert_eq!(
            fs::read_to_string(&broken).unwrap(),
            "<LanguageData><Gun.label>x</LanguageData>"
        );
    }

    #[test]
    fn patch_mod_aborts_on_missing_csv_or_folders() {
        let tree = mod_tree(None, true);
        let csv_path = tree.root.join("translations.csv");

        let err = patch_mod(&csv_path, &tree.root, DEFAULT_LANGUAGE, &StrictPatcher).unwrap_err();
        assert!(matches!(err, L10nError::FileNotFound(_)));

        fs::write(&csv_path, "key,text\nA,B\n").unwrap();
        let err = patch_mod(&csv_path, &tree.root, DEFAULT_LANGUAGE, &StrictPatcher).unwrap_err();
        assert!(matches!(err, L10nError::DirectoryNotFound(_)));
    }
}
