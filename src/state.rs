// state.rs

use crate::*;

use askama::Template;

pub type DynSensors = Box<dyn Sensors + Send>;

#[derive(Template)]
#[template(path = "index.html.ask", escape = "html")]
pub struct IndexPage {
    pub title: String,
    pub version: &'static str,
    pub channels: Vec<ChannelView>,
}

pub struct ChannelView {
    pub path: String,
    pub element_id: &'static str,
    pub unit: &'static str,
}

impl IndexPage {
    pub fn new(config: &MyConfig) -> Self {
        IndexPage {
            title: config.title.clone(),
            version: FW_VERSION,
            channels: ChannelId::all()
                .map(|id| ChannelView {
                    path: id.path(),
                    element_id: id.metric().element_id(),
                    unit: id.metric().unit(),
                })
                .collect(),
        }
    }
}

pub struct MyState {
    pub config: MyConfig,
    pub index_html: String,
    pub started: Instant,
    pub uptime: AtomicU64,
    pub api_cnt: AtomicU64,
    pub channels: Mutex<ChannelRegistry>,
    pub sensors: Mutex<DynSensors>,
}

impl MyState {
    /// The dashboard page is rendered here, once.
    pub fn new(config: MyConfig, sensors: DynSensors) -> anyhow::Result<Self> {
        let index_html = IndexPage::new(&config).render()?;
        Ok(MyState {
            config,
            index_html,
            started: Instant::now(),
            uptime: AtomicU64::new(0),
            api_cnt: AtomicU64::new(0),
            channels: Mutex::new(ChannelRegistry::new()),
            sensors: Mutex::new(sensors),
        })
    }
}

// EOF
