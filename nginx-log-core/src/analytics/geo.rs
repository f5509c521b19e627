use crate::analytics::scan::for_each_document;
use crate::analytics::stats::{Counts, percent, ranked};
use crate::analytics::types::{CityStat, ProvinceStat, RegionStat};
use crate::index::{IndexError, Query, SearchIndex};
use ahash::AHashMap;

const GEO_FIELDS: [&str; 3] = ["region_code", "province", "city"];
const CHINA_REGIONS: [&str; 4] = ["CN", "HK", "MO", "TW"];
const UNKNOWN_REGION: &str = "UNKNOWN";

/// Provincial-level divisions as (map label, standard name).
const PROVINCES: [(&str, &str); 34] = [
    ("北京", "北京市"),
    ("天津", "天津市"),
    ("上海", "上海市"),
    ("重庆", "重庆市"),
    ("河北", "河北省"),
    ("山西", "山西省"),
    ("辽宁", "辽宁省"),
    ("吉林", "吉林省"),
    ("黑龙江", "黑龙江省"),
    ("江苏", "江苏省"),
    ("浙江", "浙江省"),
    ("安徽", "安徽省"),
    ("福建", "福建省"),
    ("江西", "江西省"),
    ("山东", "山东省"),
    ("河南", "河南省"),
    ("湖北", "湖北省"),
    ("湖南", "湖南省"),
    ("广东", "广东省"),
    ("海南", "海南省"),
    ("四川", "四川省"),
    ("贵州", "贵州省"),
    ("云南", "云南省"),
    ("陕西", "陕西省"),
    ("甘肃", "甘肃省"),
    ("青海", "青海省"),
    ("台湾", "台湾省"),
    ("内蒙古", "内蒙古自治区"),
    ("广西", "广西壮族自治区"),
    ("西藏", "西藏自治区"),
    ("宁夏", "宁夏回族自治区"),
    ("新疆", "新疆维吾尔自治区"),
    ("香港", "香港特别行政区"),
    ("澳门", "澳门特别行政区"),
];

/// Standard long name of a province given either form. Unknown names pass through trimmed.
pub fn normalize_province(name: &str) -> String {
    let name = name.trim();
    PROVINCES
        .iter()
        .find(|(short, long)| *short == name || *long == name)
        .map_or_else(|| name.to_string(), |(_, long)| long.to_string())
}

/// Map label of a province given either form.
pub fn short_province(name: &str) -> String {
    let name = name.trim();
    PROVINCES
        .iter()
        .find(|(short, long)| *short == name || *long == name)
        .map_or_else(|| name.to_string(), |(short, _)| short.to_string())
}

/// Province and capital for the special administrative regions and Taiwan.
fn special_region(code: &str) -> Option<(&'static str, &'static str)> {
    match code {
        "HK" => Some(("香港特别行政区", "香港")),
        "MO" => Some(("澳门特别行政区", "澳门")),
        "TW" => Some(("台湾省", "台北")),
        _ => None,
    }
}

/// Requests per region with HK, MO and TW shown under CN.
///
/// Unlocated requests are left off the map but stay in the percent base.
pub(crate) fn world_map(
    index: &dyn SearchIndex,
    base: &Query,
    page_size: usize,
) -> Result<Vec<RegionStat>, IndexError> {
    let mut counts = Counts::default();
    let total = for_each_document(index, base, &GEO_FIELDS[..1], page_size, |doc| {
        let code = doc
            .text("region_code")
            .map(|c| c.trim().to_ascii_uppercase())
            .unwrap_or_default();
        if code.is_empty() || code == UNKNOWN_REGION {
            return;
        }
        let code = if special_region(&code).is_some() {
            "CN".to_string()
        } else {
            code
        };
        *counts.entry(code).or_default() += 1;
    })?;

    Ok(ranked(counts)
        .into_iter()
        .map(|(code, value)| RegionStat {
            percent: percent(value, total),
            code,
            value,
        })
        .collect())
}

/// Requests per province of greater China with a city breakdown each.
pub(crate) fn china_map(
    index: &dyn SearchIndex,
    base: &Query,
    page_size: usize,
) -> Result<Vec<ProvinceStat>, IndexError> {
    let query = Query::and(vec![
        base.clone(),
        Query::or(
            CHINA_REGIONS
                .iter()
                .map(|code| Query::term("region_code", *code))
                .collect(),
        ),
    ]);

    let mut provinces: AHashMap<String, (u64, Counts)> = AHashMap::new();
    let total = for_each_document(index, &query, &GEO_FIELDS, page_size, |doc| {
        let code = doc.text("region_code").unwrap_or_default();
        let city = doc.text("city").map(str::trim).unwrap_or_default();

        let (province, city) = match special_region(code) {
            Some((province, capital)) => {
                let city = if city.is_empty() { capital } else { city };
                (province.to_string(), city)
            }
            None => (normalize_province(doc.text("province").unwrap_or_default()), city),
        };
        if province.is_empty() {
            return;
        }

        let (value, cities) = provinces.entry(province).or_default();
        *value += 1;
        if !city.is_empty() {
            *cities.entry(city.to_string()).or_default() += 1;
        }
    })?;

    let mut out: Vec<ProvinceStat> = provinces
        .into_iter()
        .map(|(name, (value, cities))| ProvinceStat {
            short_name: short_province(&name),
            percent: percent(value, total),
            cities: ranked(cities)
                .into_iter()
                .map(|(name, n)| CityStat {
                    percent: percent(n, value),
                    name,
                    value: n,
                })
                .collect(),
            name,
            value,
        })
        .collect();
    out.sort_by(|a, b| b.value.cmp(&a.value).then_with(|| a.name.cmp(&b.name)));
    Ok(out)
}
