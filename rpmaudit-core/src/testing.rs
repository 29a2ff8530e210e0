//! In-memory collaborators for tests

use async_trait::async_trait;
use std::{
    collections::{HashMap, HashSet},
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Mutex,
    },
    time::Duration,
};

use crate::{AuditProgress, Error, InventorySource, ReferenceEnvironment, ReleaseSource, Result};

pub struct FakeReleaseSource {
    document: std::result::Result<String, String>,
    calls: AtomicUsize,
}

impl FakeReleaseSource {
    pub fn document(json: &str) -> Self {
        Self {
            document: Ok(json.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn images(images: &[(&str, &str)]) -> Self {
        let tags: Vec<_> = images
            .iter()
            .map(|(name, pull_ref)| {
                serde_json::json!({
                    "name": name,
                    "from": {"kind": "DockerImage", "name": pull_ref}
                })
            })
            .collect();
        let document = serde_json::json!({"references": {"spec": {"tags": tags}}});
        Self::document(&document.to_string())
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            document: Err(reason.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReleaseSource for FakeReleaseSource {
    async fn release_info(&self, release: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.document
            .clone()
            .map_err(|reason| Error::resolution(release, reason))
    }
}

enum ImageEntry {
    Packages(Vec<String>),
    ExtractionFailure,
    IoFailure,
}

pub struct FakeInventory {
    images: HashMap<String, ImageEntry>,
    extracted: Mutex<Vec<String>>,
}

impl FakeInventory {
    pub fn new() -> Self {
        Self {
            images: HashMap::new(),
            extracted: Mutex::new(Vec::new()),
        }
    }

    pub fn with_image(mut self, pull_ref: &str, packages: &[&str]) -> Self {
        let packages = packages.iter().map(|p| p.to_string()).collect();
        self.images
            .insert(pull_ref.to_string(), ImageEntry::Packages(packages));
        self
    }

    pub fn with_failure(mut self, pull_ref: &str) -> Self {
        self.images
            .insert(pull_ref.to_string(), ImageEntry::ExtractionFailure);
        self
    }

    pub fn with_io_failure(mut self, pull_ref: &str) -> Self {
        self.images.insert(pull_ref.to_string(), ImageEntry::IoFailure);
        self
    }

    /// Pull refs passed to the inventory query, in call order.
    pub fn extracted(&self) -> Vec<String> {
        self.extracted.lock().unwrap().clone()
    }
}

#[async_trait]
impl InventorySource for FakeInventory {
    async fn installed_packages(&self, pull_ref: &str) -> Result<String> {
        self.extracted.lock().unwrap().push(pull_ref.to_string());
        match self.images.get(pull_ref) {
            Some(ImageEntry::Packages(packages)) => Ok(packages.join("\n")),
            Some(ImageEntry::ExtractionFailure) => {
                Err(Error::extraction(pull_ref, "Error: initializing source: manifest unknown"))
            }
            Some(ImageEntry::IoFailure) => Err(Error::Io(std::io::Error::other("broken pipe"))),
            None => Err(Error::extraction(pull_ref, "image not found")),
        }
    }
}

pub struct FakeReference {
    active: AtomicBool,
    fail_activation: bool,
    available: HashSet<String>,
    broken: HashSet<String>,
    delay: Duration,
    activations: AtomicUsize,
    queries: Mutex<HashMap<String, usize>>,
}

impl FakeReference {
    fn with_state(active: bool) -> Self {
        Self {
            active: AtomicBool::new(active),
            fail_activation: false,
            available: HashSet::new(),
            broken: HashSet::new(),
            delay: Duration::ZERO,
            activations: AtomicUsize::new(0),
            queries: Mutex::new(HashMap::new()),
        }
    }

    pub fn active() -> Self {
        Self::with_state(true)
    }

    pub fn inactive() -> Self {
        Self::with_state(false)
    }

    pub fn provides(mut self, packages: &[&str]) -> Self {
        self.available.extend(packages.iter().map(|p| p.to_string()));
        self
    }

    pub fn broken_for(mut self, packages: &[&str]) -> Self {
        self.broken.extend(packages.iter().map(|p| p.to_string()));
        self
    }

    pub fn failing_activation(mut self) -> Self {
        self.fail_activation = true;
        self
    }

    pub fn with_delay(mut self, millis: u64) -> Self {
        self.delay = Duration::from_millis(millis);
        self
    }

    pub fn activations(&self) -> usize {
        self.activations.load(Ordering::SeqCst)
    }

    pub fn queries_for(&self, package: &str) -> usize {
        self.queries
            .lock()
            .unwrap()
            .get(package)
            .copied()
            .unwrap_or(0)
    }

    pub fn total_queries(&self) -> usize {
        self.queries.lock().unwrap().values().sum()
    }
}

#[async_trait]
impl ReferenceEnvironment for FakeReference {
    async fn is_active(&self) -> Result<bool> {
        Ok(self.active.load(Ordering::SeqCst))
    }

    async fn activate(&self) -> Result<()> {
        self.activations.fetch_add(1, Ordering::SeqCst);
        if self.fail_activation {
            return Err(Error::ReferenceEnvironment(
                "container name \"ubi\" is already in use".into(),
            ));
        }
        self.active.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn query_provides(&self, package: &str) -> Result<bool> {
        *self
            .queries
            .lock()
            .unwrap()
            .entry(package.to_string())
            .or_insert(0) += 1;

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        if self.broken.contains(package) {
            return Err(Error::query(package, "exit status 125"));
        }
        Ok(self.available.contains(package))
    }

    async fn deactivate(&self) -> Result<()> {
        self.active.store(false, Ordering::SeqCst);
        Ok(())
    }
}

/// Records progress events as strings.
#[derive(Default)]
pub struct RecordingProgress {
    events: Mutex<Vec<String>>,
}

impl RecordingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    fn push(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }
}

impl AuditProgress for RecordingProgress {
    fn images_started(&self, total: usize) {
        self.push(format!("images {}", total));
    }

    fn image_started(&self, image: &str) {
        self.push(format!("start {}", image));
    }

    fn lookups_started(&self, image: &str, total: usize) {
        self.push(format!("lookups {} {}", image, total));
    }

    fn looking_up(&self, image: &str, package: &str) {
        self.push(format!("lookup {} {}", image, package));
    }

    fn looked_up(&self, image: &str, package: &str) {
        self.push(format!("found {} {}", image, package));
    }

    fn image_finished(&self, image: &str) {
        self.push(format!("finish {}", image));
    }
}
