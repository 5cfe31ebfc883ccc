//! End-to-end pipeline runs against a local HTTP server.

use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use actor::executor::SystemExecutor;
use actor::host::xml::list_plugins;
use actor::host::XmlHostConfig;
use actor::manifest::{Component, ComponentType, Manifest};
use actor::pipeline::{ComponentOutcome, InstallPolicy, Orchestrator, PipelineContext, Session};
use actor::probe::{ProbeError, VersionProbe, VersionStatus};
use actor::transport::HttpTransport;
use actor::ui::MockUI;
use httpmock::prelude::*;
use indexmap::IndexMap;
use tempfile::TempDir;
use zip::write::SimpleFileOptions;

struct FixedProbe {
    up_to_date: bool,
}

impl VersionProbe for FixedProbe {
    fn probe(
        &self,
        component: &Component,
        _install_root: Option<&Path>,
        _on_error: &mut dyn FnMut(&Component, &ProbeError),
    ) -> VersionStatus {
        if self.up_to_date {
            VersionStatus {
                up_to_date: true,
                installed_version: component.version.clone(),
            }
        } else {
            VersionStatus::default()
        }
    }
}

fn zip_bytes(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    for (name, content) in entries {
        zip.start_file(*name, options).unwrap();
        zip.write_all(content.as_bytes()).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

struct Layout {
    _temp: TempDir,
    root: PathBuf,
    scratch: PathBuf,
    host_config: PathBuf,
}

impl Layout {
    fn new() -> Self {
        let temp = TempDir::new().unwrap();
        Self {
            root: temp.path().join("ACT"),
            scratch: temp.path().join("download"),
            host_config: temp.path().join("Config").join("act.config.xml"),
            _temp: temp,
        }
    }

    fn run(
        &self,
        manifest: &Manifest,
        prober: &dyn VersionProbe,
        ui: &mut MockUI,
    ) -> actor::Result<actor::pipeline::RunReport> {
        fs::create_dir_all(&self.root).unwrap();
        let transport = HttpTransport::new().unwrap();
        let mut host = XmlHostConfig::new(&self.host_config, &transport);
        let executor = SystemExecutor;
        let session =
            Session::new(&self.scratch, InstallPolicy::Prompt).with_install_root(&self.root);
        let ctx = PipelineContext {
            transport: &transport,
            prober,
            executor: &executor,
            host: &mut host,
            ui,
        };
        Orchestrator::new(ctx, session).run(manifest)
    }
}

fn manifest_for(server: &MockServer) -> Manifest {
    let foo = Component {
        install_order: 1,
        url: server.url("/Foo.zip"),
        file_name: "Foo.zip".to_string(),
        name: "Foo".to_string(),
        version: "1.2.0".to_string(),
        component_type: ComponentType::Archive,
        is_plugin: true,
        libraries: vec!["Foo.dll".to_string()],
        configurations: IndexMap::from([(
            server.url("/foo.config"),
            "\\Config\\foo.config.xml".to_string(),
        )]),
        ..Default::default()
    };
    let bar = Component {
        install_order: 2,
        url: server.url("/repos/o/bar/releases/latest"),
        file_name: "Bar.zip".to_string(),
        name: "Bar".to_string(),
        version: "0.3.1".to_string(),
        is_plugin: true,
        is_from_github: true,
        install_arguments: "0".to_string(),
        libraries: vec!["bin\\Bar.dll".to_string()],
        ..Default::default()
    };
    Manifest::new(vec![bar, foo]).unwrap()
}

#[test]
fn installs_plugins_and_registers_them() {
    let server = MockServer::start();
    let foo_zip = server.mock(|when, then| {
        when.method(GET).path("/Foo.zip");
        then.status(200)
            .body(zip_bytes(&[("Foo.dll", "foo"), ("docs/readme.txt", "hi")]));
    });
    server.mock(|when, then| {
        when.method(GET).path("/repos/o/bar/releases/latest");
        then.status(200).body(format!(
            r#"{{"tag_name":"v0.3.1","assets":[{{"name":"Bar.zip","browser_download_url":"{}"}}]}}"#,
            server.url("/Bar.zip")
        ));
    });
    server.mock(|when, then| {
        when.method(GET).path("/Bar.zip");
        then.status(200).body(zip_bytes(&[("bin/Bar.dll", "bar")]));
    });
    let foo_config = server.mock(|when, then| {
        when.method(GET).path("/foo.config");
        then.status(200).body("<FooConfig/>");
    });

    let layout = Layout::new();
    let manifest = manifest_for(&server);
    let mut ui = MockUI::new();

    let report = layout
        .run(&manifest, &FixedProbe { up_to_date: false }, &mut ui)
        .unwrap();

    assert_eq!(report.installed(), 2);
    let foo_dir = layout.root.join("plugin").join("Foo");
    let bar_dir = layout.root.join("plugin").join("Bar");
    assert_eq!(fs::read_to_string(foo_dir.join("Foo.dll")).unwrap(), "foo");
    assert!(foo_dir.join("docs").join("readme.txt").exists());
    assert_eq!(
        fs::read_to_string(bar_dir.join("bin").join("Bar.dll")).unwrap(),
        "bar"
    );
    assert_eq!(
        fs::read_to_string(layout.root.join("Config").join("foo.config.xml")).unwrap(),
        "<FooConfig/>"
    );

    let plugins = list_plugins(&fs::read_to_string(&layout.host_config).unwrap()).unwrap();
    let paths: Vec<_> = plugins.iter().map(|p| PathBuf::from(&p.path)).collect();
    assert_eq!(
        paths,
        vec![foo_dir.join("Foo.dll"), bar_dir.join("bin").join("Bar.dll")]
    );
    assert!(plugins.iter().all(|p| p.enabled));
    assert!(!layout.scratch.exists());
    foo_zip.assert_hits(1);
    foo_config.assert_hits(1);
}

#[test]
fn up_to_date_rerun_only_refreshes_registration() {
    let server = MockServer::start();
    let foo_zip = server.mock(|when, then| {
        when.method(GET).path("/Foo.zip");
        then.status(200).body(zip_bytes(&[("Foo.dll", "foo")]));
    });
    let listing = server.mock(|when, then| {
        when.method(GET).path("/repos/o/bar/releases/latest");
        then.status(200).body(r#"{"assets":[]}"#);
    });
    let foo_config = server.mock(|when, then| {
        when.method(GET).path("/foo.config");
        then.status(200).body("<FooConfig/>");
    });

    let layout = Layout::new();
    let existing = layout.root.join("Config").join("foo.config.xml");
    fs::create_dir_all(existing.parent().unwrap()).unwrap();
    fs::write(&existing, "<Mine/>").unwrap();

    let manifest = manifest_for(&server);
    let mut ui = MockUI::new();
    ui.set_prompt_response("overwrite_configurations", "no");

    let report = layout
        .run(&manifest, &FixedProbe { up_to_date: true }, &mut ui)
        .unwrap();

    assert_eq!(report.up_to_date(), 2);
    assert_eq!(report.outcome_of("Foo"), Some(&ComponentOutcome::UpToDate));
    foo_zip.assert_hits(0);
    listing.assert_hits(0);
    foo_config.assert_hits(0);
    assert_eq!(fs::read_to_string(&existing).unwrap(), "<Mine/>");
    assert_eq!(ui.prompt_count("overwrite_configurations"), 1);

    let plugins = list_plugins(&fs::read_to_string(&layout.host_config).unwrap()).unwrap();
    assert_eq!(plugins.len(), 2);
}

#[test]
fn failed_download_stops_the_run() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/Foo.zip");
        then.status(404);
    });
    let listing = server.mock(|when, then| {
        when.method(GET).path("/repos/o/bar/releases/latest");
        then.status(200).body(r#"{"assets":[]}"#);
    });

    let layout = Layout::new();
    let manifest = manifest_for(&server);
    let mut ui = MockUI::new();

    let err = layout
        .run(&manifest, &FixedProbe { up_to_date: false }, &mut ui)
        .unwrap_err();

    assert!(matches!(err, actor::ActorError::DownloadFailed { .. }));
    assert!(err.is_fatal());
    listing.assert_hits(0);
    assert!(!layout.host_config.exists());
    assert!(!layout.scratch.join("Foo.zip").exists());
}
