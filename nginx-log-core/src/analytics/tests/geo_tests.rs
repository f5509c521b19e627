use super::{DAY1, LOG, index_with, located};
use crate::analytics::{
    CityStat, DashboardQueryRequest, RegionStat, normalize_province, short_province,
};
use pretty_assertions::assert_eq;

fn day_one() -> DashboardQueryRequest {
    DashboardQueryRequest {
        start_time: Some(DAY1),
        end_time: Some(DAY1 + 86_399),
        log_path: LOG.to_string(),
    }
}

#[test]
fn provinces_normalize_to_long_form() {
    assert_eq!(normalize_province("北京"), "北京市");
    assert_eq!(normalize_province("内蒙古"), "内蒙古自治区");
    assert_eq!(normalize_province("广东省"), "广东省");
    assert_eq!(normalize_province(" Somewhere "), "Somewhere");
    assert_eq!(short_province("新疆维吾尔自治区"), "新疆");
    assert_eq!(short_province("上海"), "上海");
}

#[test]
fn world_map_folds_greater_china_and_hides_unknown() {
    // Arrange
    let (_, service) = index_with(
        LOG,
        &[
            located(DAY1, "CN", "北京", "北京"),
            located(DAY1 + 1, "HK", "", ""),
            located(DAY1 + 2, "US", "", ""),
            located(DAY1 + 3, "UNKNOWN", "", ""),
            located(DAY1 + 4, "", "", ""),
        ],
    );

    // Act
    let map = service.world_map_at(&day_one(), DAY1).unwrap();

    // Assert
    assert_eq!(
        map,
        vec![
            RegionStat {
                code: "CN".to_string(),
                value: 2,
                percent: 40.0,
            },
            RegionStat {
                code: "US".to_string(),
                value: 1,
                percent: 20.0,
            },
        ]
    );
}

#[test]
fn china_map_rolls_up_provinces_and_cities() {
    // Arrange
    let (_, service) = index_with(
        LOG,
        &[
            located(DAY1, "CN", "北京", "北京"),
            located(DAY1 + 1, "CN", "北京市", "北京"),
            located(DAY1 + 2, "CN", "内蒙古", "呼和浩特"),
            located(DAY1 + 3, "HK", "", ""),
            located(DAY1 + 4, "TW", "", "高雄"),
            located(DAY1 + 5, "CN", "", ""),
            located(DAY1 + 6, "US", "California", "San Jose"),
        ],
    );

    // Act
    let map = service.china_map_at(&day_one(), DAY1).unwrap();

    // Assert
    assert_eq!(map.len(), 4);
    assert_eq!(map[0].name, "北京市");
    assert_eq!(map[0].short_name, "北京");
    assert_eq!(map[0].value, 2);
    assert_eq!(map[0].percent, 200.0 / 6.0);
    assert_eq!(
        map[0].cities,
        vec![CityStat {
            name: "北京".to_string(),
            value: 2,
            percent: 100.0,
        }]
    );

    let find = |name: &str| map.iter().find(|p| p.name == name).unwrap();
    assert_eq!(find("内蒙古自治区").short_name, "内蒙古");
    assert_eq!(find("香港特别行政区").cities[0].name, "香港");
    assert_eq!(find("台湾省").cities[0].name, "高雄");
    assert_eq!(find("台湾省").percent, 100.0 / 6.0);
}

#[test]
fn china_map_of_empty_range_is_empty() {
    let (_, service) = index_with(LOG, &[located(DAY1, "CN", "北京", "北京")]);
    let req = DashboardQueryRequest {
        start_time: Some(DAY1 + 86_400),
        end_time: Some(DAY1 + 2 * 86_400),
        log_path: String::new(),
    };

    assert!(service.china_map_at(&req, DAY1).unwrap().is_empty());
}
