// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Deklaracije-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Deklaracije and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! End-to-end persistence behavior through the public workspace API.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use deklaracije::app::Workspace;
use deklaracije::import::{build_rows, CellValue, ImportFile};
use deklaracije::media::PassthroughTransform;
use deklaracije::model::FilePayload;
use deklaracije::store::StateFolder;

struct TempDir {
    path: std::path::PathBuf,
}

impl TempDir {
    fn new(prefix: &str) -> Self {
        let nanos = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_nanos();
        let mut path = std::env::temp_dir();
        path.push(format!("deklaracije-it-{prefix}-{}-{nanos}", std::process::id()));
        std::fs::create_dir_all(&path).unwrap();
        Self { path }
    }

    fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.path);
    }
}

fn sheet(names: &[(f64, &str)]) -> deklaracije::import::ParsedSheet {
    let data: Vec<Vec<CellValue>> = names
        .iter()
        .map(|(rb, name)| vec![CellValue::Number(*rb), CellValue::Text((*name).to_owned())])
        .collect();
    build_rows(&data)
}

fn file(name: &str, bytes: &[u8], media_type: &str) -> ImportFile {
    ImportFile {
        name: name.to_owned(),
        payload: FilePayload::new(bytes.to_vec(), media_type),
    }
}

#[test]
fn populated_workspace_survives_a_restart() {
    let tmp = TempDir::new("roundtrip");
    let state_dir = tmp.path().join("state");

    {
        let folder = StateFolder::new(&state_dir);
        let mut workspace = Workspace::with_quiet_interval(folder, Duration::from_millis(20));
        workspace.set_institution_name("Osnovna škola Vrbani");
        workspace.load_sheet(sheet(&[(1.0, "Stolica"), (2.0, "Stol"), (3.0, "Ormar")]));
        workspace.set_brand(1, "Acme");

        workspace.attach_files(
            1,
            vec![
                file("slika1.jpg", b"jpeg-one", "image/jpeg"),
                file("slika2.png", b"png-two", "image/png"),
            ],
            &PassthroughTransform,
        );
        workspace.attach_files(
            3,
            vec![file("deklaracija.pdf", b"pdf-three", "application/pdf")],
            &PassthroughTransform,
        );
        workspace.flush();
    }

    let folder = StateFolder::new(&state_dir);
    let mut workspace = Workspace::with_quiet_interval(folder, Duration::from_millis(20));
    assert!(workspace.restore().unwrap());

    assert_eq!(workspace.session().institution_name(), "Osnovna škola Vrbani");
    assert_eq!(workspace.session().rows().len(), 3);

    let first = workspace.session().find_row(1).expect("row 1");
    let names: Vec<_> = first
        .images()
        .iter()
        .map(|image| image.final_filename())
        .collect();
    assert_eq!(names, vec!["1. Acme Stolica.jpg", "1. Acme Stolica (2).png"]);
    assert_eq!(first.images()[0].payload().bytes(), b"jpeg-one");
    assert_eq!(first.images()[1].payload().bytes(), b"png-two");
    assert_eq!(first.images()[0].original_filename(), "slika1.jpg");

    let third = workspace.session().find_row(3).expect("row 3");
    assert_eq!(third.images()[0].payload().bytes(), b"pdf-three");

    // Transient fields are not persisted.
    assert!(first.images().iter().all(|image| image.thumbnail().is_none()));
    assert!(first.images().iter().all(|image| !image.is_editing()));

    let second = workspace.session().find_row(2).expect("row 2");
    assert!(second.images().is_empty());
}

#[test]
fn clear_storage_wins_over_a_mutation_made_just_before_it() {
    let tmp = TempDir::new("clear-race");
    let state_dir = tmp.path().join("state");
    let folder = StateFolder::new(&state_dir);
    let mut workspace = Workspace::with_quiet_interval(folder.clone(), Duration::from_millis(30));

    workspace.load_sheet(sheet(&[(1.0, "Stolica")]));
    workspace.attach_files(
        1,
        vec![file("1. a.jpg", b"bytes", "image/jpeg")],
        &PassthroughTransform,
    );
    workspace.flush();
    assert!(folder.has_stored_data());

    // Mutate, then clear ~immediately: the pending autosave must not
    // resurrect anything after the clear completes.
    workspace.set_brand(1, "Acme");
    std::thread::sleep(Duration::from_millis(1));
    workspace.clear_storage().unwrap();

    std::thread::sleep(Duration::from_millis(150));
    assert!(!folder.has_stored_data());
    assert!(folder.get_all_binaries().unwrap().is_empty());
    assert!(workspace.session().rows().is_empty());
}

#[test]
fn a_fresh_store_restores_nothing() {
    let tmp = TempDir::new("fresh");
    let folder = StateFolder::new(tmp.path().join("state"));
    let mut workspace = Workspace::with_quiet_interval(folder, Duration::from_millis(20));

    assert!(!workspace.has_stored_data());
    assert!(!workspace.restore().unwrap());
    assert_eq!(workspace.stored_timestamp(), None);
}
