//! Reddit: first post from the public search JSON.

use {beeline_common::urls::encode_query, reqwest::Client, serde::Deserialize};

use crate::{
    fetch::{USER_AGENT, get_json},
    html::absolutize,
    lenient,
    resolver::PlatformEndpoints,
};

const ORIGIN: &str = "https://www.reddit.com";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Listing {
    #[serde(deserialize_with = "lenient::or_default")]
    data: ListingData,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ListingData {
    #[serde(deserialize_with = "lenient::items")]
    children: Vec<Child>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Child {
    #[serde(deserialize_with = "lenient::or_default")]
    data: Post,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Post {
    #[serde(deserialize_with = "lenient::or_default")]
    permalink: String,
}

pub(crate) async fn first_post(
    client: &Client,
    endpoints: &PlatformEndpoints,
    keyword: &str,
    latest: bool,
) -> Option<String> {
    let keyword = keyword.trim();
    if keyword.is_empty() {
        return None;
    }
    let sort = if latest {
        "&sort=new"
    } else {
        ""
    };
    let url = format!(
        "{}/search.json?q={}&limit=1&type=link{sort}",
        endpoints.reddit,
        encode_query(keyword)
    );
    let listing: Listing = get_json(client, &url, &[("User-Agent", USER_AGENT)]).await?;
    let permalink = listing
        .data
        .children
        .into_iter()
        .next()
        .map(|child| child.data.permalink.trim().to_string())
        .filter(|p| !p.is_empty())?;
    Some(absolutize(ORIGIN, &permalink))
}
