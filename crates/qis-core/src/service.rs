//! Background service: routes host events to the saver and profile detector.
//!
//! One `Background` lives for the whole process. It owns the only
//! [`ProfileDetector`], so the profile state is a per-process singleton.

use std::sync::Arc;
use std::time::Duration;

use lazy_static::lazy_static;
use regex::Regex;

use crate::config::QisConfig;
use crate::message::{parse_message, InboundMessage, MessageResponse};
use crate::orchestrator::ImageSaver;
use crate::platform::{
    DownloadId, DownloadPlatform, DownloadRequest, SettingsStore, DEFAULT_SAVE_LOCATION,
    KEY_SAVE_LOCATION,
};
use crate::profile::ProfileDetector;

/// Menu item that starts a diagnostic download.
pub const MENU_TEST_DOWNLOADS: &str = "testDownloads";
/// Second menu item wired to the same diagnostic download.
pub const MENU_TEST_DOWNLOAD_METHODS: &str = "test_download_methods";
/// Filename used by the diagnostic download.
pub const TEST_DOWNLOAD_FILENAME: &str = "test-download.png";

lazy_static! {
    static ref DIRECT_IMAGE_URL: Regex =
        Regex::new(r"(?i)\.(jpg|jpeg|png|gif|webp|svg|bmp)$").expect("static regex");
}

/// Loading status reported with a tab update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabStatus {
    Loading,
    Complete,
}

/// Ask the host to attach a double-click listener to the image in a tab
/// that is showing the image file itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewerInjection {
    pub image_url: String,
}

pub struct Background<P: ?Sized, S: ?Sized> {
    platform: Arc<P>,
    store: Arc<S>,
    saver: ImageSaver<P>,
    profile: Arc<ProfileDetector<P, S>>,
    test_download_url: String,
}

impl<P, S> Background<P, S>
where
    P: DownloadPlatform + ?Sized + 'static,
    S: SettingsStore + ?Sized + 'static,
{
    pub fn new(platform: Arc<P>, store: Arc<S>, cfg: &QisConfig) -> Self {
        let profile = ProfileDetector::new(Arc::clone(&platform), Arc::clone(&store))
            .with_settle_delay(Duration::from_millis(cfg.probe_settle_ms));
        Self {
            saver: ImageSaver::new(Arc::clone(&platform)),
            profile: Arc::new(profile),
            test_download_url: cfg.test_download_url.clone(),
            platform,
            store,
        }
    }

    pub fn profile(&self) -> &Arc<ProfileDetector<P, S>> {
        &self.profile
    }

    /// Extension installed or updated.
    pub async fn on_installed(&self) -> bool {
        tracing::info!("image saver installed");
        self.profile.initialize().await
    }

    /// Browser started with the extension already installed.
    pub async fn on_startup(&self) -> bool {
        tracing::debug!("image saver starting");
        self.profile.initialize().await
    }

    /// Handles a raw runtime message. `None` means "not mine": the host
    /// should not send a reply.
    pub fn handle_message(&self, raw: &str) -> Option<MessageResponse> {
        match parse_message(raw) {
            Ok(msg) => Some(self.dispatch(msg)),
            Err(e) => {
                tracing::debug!("ignoring message: {}", e);
                None
            }
        }
    }

    /// Handles a parsed message. The save runs in the background; the reply
    /// does not wait for it.
    pub fn dispatch(&self, msg: InboundMessage) -> MessageResponse {
        match msg {
            InboundMessage::SaveImage { image_url } => {
                tracing::info!("received save image request for {}", image_url);
                let saver = self.saver.clone();
                tokio::spawn(async move {
                    saver.save(&image_url).await;
                });
                MessageResponse::ok()
            }
        }
    }

    /// A tab changed; when it finished loading an image file directly,
    /// ask for the viewer listener to be injected.
    pub fn on_tab_updated(&self, status: TabStatus, url: Option<&str>) -> Option<ViewerInjection> {
        let url = url?;
        if status != TabStatus::Complete || !is_direct_image_url(url) {
            return None;
        }
        tracing::debug!("tab shows image file directly: {}", url);
        Some(ViewerInjection {
            image_url: url.to_string(),
        })
    }

    /// Context menu click. Only the diagnostic menu items do anything.
    pub async fn on_menu_clicked(&self, menu_id: &str) -> Option<DownloadId> {
        match menu_id {
            MENU_TEST_DOWNLOADS | MENU_TEST_DOWNLOAD_METHODS => self.test_download().await,
            other => {
                tracing::debug!("unknown menu item {}", other);
                None
            }
        }
    }

    /// Downloads the configured test URL as `test-download.png`.
    pub async fn test_download(&self) -> Option<DownloadId> {
        let request = DownloadRequest::named(&self.test_download_url, TEST_DOWNLOAD_FILENAME);
        match self.platform.download(request).await {
            Ok(id) => {
                tracing::info!("test download started, id={}", id);
                Some(id)
            }
            Err(e) => {
                tracing::error!("test download failed: {}", e);
                None
            }
        }
    }

    /// Preferred save folder. Stored for the options page; saves do not use it.
    pub async fn save_location(&self) -> String {
        match self.store.get(KEY_SAVE_LOCATION).await {
            Ok(Some(loc)) if !loc.is_empty() => loc,
            Ok(_) => DEFAULT_SAVE_LOCATION.to_string(),
            Err(e) => {
                tracing::warn!("reading save location failed: {}", e);
                DEFAULT_SAVE_LOCATION.to_string()
            }
        }
    }
}

/// True for URLs whose path ends in a common image extension.
pub fn is_direct_image_url(url: &str) -> bool {
    DIRECT_IMAGE_URL.is_match(url)
}
