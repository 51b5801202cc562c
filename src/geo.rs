// src/geo.rs
//
// City -> province aggregation and the interactive choropleth artifact. The
// lookup table is the sample set shipped with the original data; anything it
// does not cover lands in the "其他" bucket.

use anyhow::{Context, Result};
use serde_json::json;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::info;

const OTHER_BUCKET: &str = "其他";

const CITY_TO_PROVINCE: [(&str, &str); 16] = [
    ("北京", "北京"),
    ("上海", "上海"),
    ("广州", "广东"),
    ("深圳", "广东"),
    ("杭州", "浙江"),
    ("南京", "江苏"),
    ("成都", "四川"),
    ("重庆", "重庆"),
    ("武汉", "湖北"),
    ("西安", "陕西"),
    ("长沙", "湖南"),
    ("天津", "天津"),
    ("青岛", "山东"),
    ("济南", "山东"),
    ("郑州", "河南"),
    ("沈阳", "辽宁"),
];

pub fn province_of(city: &str) -> &'static str {
    CITY_TO_PROVINCE
        .iter()
        .find(|(c, _)| *c == city)
        .map(|(_, p)| *p)
        .unwrap_or(OTHER_BUCKET)
}

/// Count reviews per province. Callers pass only known cities; records
/// without a city never reach this point.
pub fn aggregate<'a, I>(cities: I) -> BTreeMap<String, u64>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut counts = BTreeMap::new();
    for city in cities {
        *counts.entry(province_of(city).to_string()).or_insert(0u64) += 1;
    }
    counts
}

const MAP_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>各省份评论数量分布</title>
    <script src="https://assets.pyecharts.org/assets/echarts.min.js"></script>
    <script src="https://assets.pyecharts.org/assets/maps/china.js"></script>
</head>
<body>
    <div id="map" style="width:1200px; height:800px;"></div>
    <script>
        var chart = echarts.init(document.getElementById('map'));
        chart.setOption(__OPTION__);
    </script>
</body>
</html>
"#;

/// Write the province counts as a standalone interactive ECharts map.
pub fn render_map(counts: &BTreeMap<String, u64>, path: &Path) -> Result<()> {
    let max = counts.values().copied().max().unwrap_or(100);
    let data: Vec<_> = counts
        .iter()
        .map(|(province, n)| json!({ "name": province, "value": n }))
        .collect();

    let option = json!({
        "title": { "text": "各省份评论数量分布" },
        "tooltip": { "trigger": "item" },
        "visualMap": {
            "min": 0,
            "max": max,
            "text": ["高", "低"],
            "inRange": { "color": ["lightskyblue", "lightcoral"] }
        },
        "toolbox": { "show": true },
        "series": [{
            "name": "评论数量",
            "type": "map",
            "map": "china",
            "showLegendSymbol": false,
            "data": data
        }]
    });

    let html = MAP_TEMPLATE.replace("__OPTION__", &serde_json::to_string_pretty(&option)?);
    fs::write(path, html).with_context(|| format!("write {:?}", path))?;
    info!("Province map saved - path={:?}, provinces={}", path, counts.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_cities_map_to_their_province() {
        assert_eq!(province_of("深圳"), "广东");
        assert_eq!(province_of("济南"), "山东");
        assert_eq!(province_of("北京"), "北京");
    }

    #[test]
    fn unmapped_cities_fall_into_the_other_bucket() {
        let cities = vec![Some("北京"), Some("Unknown City"), None];
        let counts = aggregate(cities.into_iter().flatten());
        assert_eq!(counts.get("北京"), Some(&1));
        assert_eq!(counts.get(OTHER_BUCKET), Some(&1));
        assert_eq!(counts.values().sum::<u64>(), 2);
    }

    #[test]
    fn same_province_cities_accumulate() {
        let counts = aggregate(["广州", "深圳", "青岛", "济南"]);
        assert_eq!(counts.get("广东"), Some(&2));
        assert_eq!(counts.get("山东"), Some(&2));
    }

    #[test]
    fn map_option_scales_to_observed_max() {
        let counts = aggregate(["北京", "北京", "上海"]);
        assert_eq!(counts.values().copied().max(), Some(2));
    }
}
