use crate::config::SourceConfig;
use url::Url;

/// URL builder for the catalog's three page shapes
#[derive(Debug, Clone)]
pub struct Endpoints {
    root: Url,
    listing_params: Vec<(String, String)>,
}

impl Endpoints {
    /// Builds endpoints rooted at `{base-url}/{language}/`
    pub fn new(config: &SourceConfig) -> Result<Self, url::ParseError> {
        let mut base = Url::parse(&config.base_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let root = base.join(&format!("{}/", config.language))?;

        Ok(Self {
            root,
            listing_params: config
                .listing_params
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        })
    }

    /// Language root every page lives under
    pub fn root(&self) -> &Url {
        &self.root
    }

    /// Listing page for one partition (release year)
    pub fn listing_url(&self, partition: i32) -> Result<Url, url::ParseError> {
        let mut url = self.root.join("topgen.php")?;
        {
            let mut query = url.query_pairs_mut();
            for (key, value) in &self.listing_params {
                query.append_pair(key, value);
            }
            let year = partition.to_string();
            query.append_pair("fromyear", &year);
            query.append_pair("toyear", &year);
        }
        Ok(url)
    }

    /// Review page `page` (1-based) for `item_id`
    pub fn review_url(&self, item_id: &str, page: u32) -> Result<Url, url::ParseError> {
        self.root.join(&format!("reviews/{}/{}.html", page, item_id))
    }

    /// Detail page for `item_id`
    pub fn detail_url(&self, item_id: &str) -> Result<Url, url::ParseError> {
        self.root.join(&format!("film{}.html", item_id))
    }
}
