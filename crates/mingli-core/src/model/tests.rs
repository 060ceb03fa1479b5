use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};

use crate::model::*;
use crate::testing;

#[test]
fn test_pseudo_identity() {
    let now = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
    let user = NewUser::pseudo("测试用户", Some("https://via.placeholder.com/150"), now);
    assert_eq!(
        user.wechat_openid,
        format!("mock_user_{}", now.timestamp_millis())
    );
    assert_eq!(user.nickname, "测试用户");
    assert_eq!(
        user.avatar_url.as_deref(),
        Some("https://via.placeholder.com/150")
    );
}

#[test]
fn test_user_from_server_row_ignores_extra_fields() {
    let user: User = serde_json::from_str(
        r#"{"id": 7, "wechat_openid": "mock_user_1", "nickname": "Ann",
            "avatar_url": null, "created_at": "2024-01-01T00:00:00"}"#,
    )
    .unwrap();
    assert_eq!(user.id, 7);
    assert!(user.avatar_url.is_none());
}

#[test]
fn test_create_user_response_without_id() {
    let resp: CreateUserResponse = serde_json::from_str(r#"{"success": false}"#).unwrap();
    assert!(!resp.success);
    assert!(resp.user_id.is_none());
}

#[test]
fn test_birth_record_from_server_row() {
    let record: BirthRecord = serde_json::from_value(serde_json::json!({
        "id": 3,
        "user_id": 1,
        "nickname": "小明",
        "birth_date": "1990-05-17",
        "birth_time": "08:30:00",
        "birth_place": "杭州",
        "gender": "male",
        "longitude": null,
        "latitude": null,
        "created_at": "2024-01-02T10:00:00",
        "updated_at": "2024-01-02T10:00:00"
    }))
    .unwrap();
    assert_eq!(record.gender, Gender::Male);
    assert_eq!(record.birth_date, NaiveDate::from_ymd_opt(1990, 5, 17).unwrap());
    assert_eq!(record.birth_time, NaiveTime::from_hms_opt(8, 30, 0).unwrap());
    assert_eq!(record.birth_place.as_deref(), Some("杭州"));
}

#[test]
fn test_birth_time_accepts_seconds_and_short_form() {
    let mut row = serde_json::to_value(testing::record(1, 1, "A")).unwrap();
    row["birth_time"] = serde_json::json!(30600);
    let record: BirthRecord = serde_json::from_value(row.clone()).unwrap();
    assert_eq!(record.birth_time, NaiveTime::from_hms_opt(8, 30, 0).unwrap());

    row["birth_time"] = serde_json::json!("23:05");
    let record: BirthRecord = serde_json::from_value(row).unwrap();
    assert_eq!(record.birth_time, NaiveTime::from_hms_opt(23, 5, 0).unwrap());
}

#[test]
fn test_new_birth_record_body_is_flat() {
    let draft = testing::draft("小红");
    let body = serde_json::to_value(NewBirthRecord {
        user_id: 9,
        draft: &draft,
    })
    .unwrap();
    assert_eq!(body["user_id"], 9);
    assert_eq!(body["nickname"], "小红");
    assert_eq!(body["gender"], "female");
    assert_eq!(body["birth_date"], "1992-11-03");
    assert_eq!(body["birth_time"], "21:15:00");
    assert!(body.get("birth_place").is_none());
}

#[test]
fn test_draft_validation() {
    assert!(testing::draft("ok").validate().is_ok());
    assert!(testing::draft("   ").validate().is_err());
    assert!(testing::draft(&"名".repeat(MAX_NICKNAME_LENGTH)).validate().is_ok());
    assert!(testing::draft(&"名".repeat(MAX_NICKNAME_LENGTH + 1))
        .validate()
        .is_err());

    let mut draft = testing::draft("ok");
    draft.birth_place = Some("x".repeat(MAX_PLACE_LENGTH + 1));
    assert!(draft.validate().is_err());
}

#[test]
fn test_draft_normalized_drops_blank_place() {
    let mut draft = testing::draft("  小红  ");
    draft.birth_place = Some("   ".into());
    let draft = draft.normalized();
    assert_eq!(draft.nickname, "小红");
    assert!(draft.birth_place.is_none());
}

#[test]
fn test_parse_user_input() {
    assert_eq!(
        parse_birth_date("2001-02-03").unwrap(),
        NaiveDate::from_ymd_opt(2001, 2, 3).unwrap()
    );
    assert!(parse_birth_date("03/02/2001").is_err());
    assert_eq!(
        parse_birth_time("7:45").unwrap(),
        NaiveTime::from_hms_opt(7, 45, 0).unwrap()
    );
    assert!(parse_birth_time("25:00").is_err());
}

#[test]
fn test_gender_parse_and_toggle() {
    assert_eq!("male".parse::<Gender>().unwrap(), Gender::Male);
    assert_eq!("女".parse::<Gender>().unwrap(), Gender::Female);
    assert!("other".parse::<Gender>().is_err());
    assert_eq!(Gender::Male.toggled(), Gender::Female);
}

#[test]
fn test_mutation_response_defaults_to_success() {
    let resp: MutationResponse = serde_json::from_str("{}").unwrap();
    assert!(resp.success);
    let resp: MutationResponse = serde_json::from_str(r#"{"success": false}"#).unwrap();
    assert!(!resp.success);
}

#[test]
fn test_analysis_kind_cycle() {
    assert_eq!(AnalysisKind::Bazi.next(), AnalysisKind::Ziwei);
    assert_eq!(AnalysisKind::Astrology.next(), AnalysisKind::Bazi);
    assert_eq!(AnalysisKind::Bazi.prev(), AnalysisKind::Astrology);
    assert_eq!("ZIWEI".parse::<AnalysisKind>().unwrap(), AnalysisKind::Ziwei);
    assert_eq!(AnalysisKind::Astrology.to_string(), "astrology");
}

#[test]
fn test_analysis_request_body() {
    let body = serde_json::to_value(AnalysisRequest {
        birth_info_id: 5,
        analysis_type: AnalysisKind::Ziwei,
    })
    .unwrap();
    assert_eq!(
        body,
        serde_json::json!({"birth_info_id": 5, "analysis_type": "ziwei"})
    );
}

#[test]
fn test_bazi_result_keeps_section_order() {
    let result = AnalysisResult::from_value(AnalysisKind::Bazi, testing::bazi_json()).unwrap();
    let AnalysisResult::Bazi(chart) = &result else {
        panic!("expected bazi chart");
    };
    assert_eq!(chart.bazi.year, "庚午");
    let elements: Vec<&str> = chart.wuxing.iter().map(|(k, _)| k).collect();
    assert_eq!(elements, vec!["金", "木", "水", "火", "土"]);
    assert_eq!(chart.wuxing.get("水"), Some(&2));
    let titles: Vec<&str> = result.sections().iter().map(|(k, _)| k).collect();
    assert_eq!(titles, vec!["性格特点", "事业运势"]);
}

#[test]
fn test_ziwei_result() {
    let result = AnalysisResult::from_value(AnalysisKind::Ziwei, testing::ziwei_json()).unwrap();
    assert_eq!(result.kind(), AnalysisKind::Ziwei);
    let AnalysisResult::Ziwei(chart) = result else {
        panic!("expected ziwei chart");
    };
    let ming = chart.mingpan.get("命宫").unwrap();
    assert_eq!(ming.main_star, "紫微");
    assert_eq!(ming.minor_stars, vec!["天府", "天相"]);
    assert!(chart.mingpan.get("迁移宫").unwrap().minor_stars.is_empty());
}

#[test]
fn test_astrology_result_without_houses() {
    let mut value = testing::astrology_json();
    value.as_object_mut().unwrap().remove("houses");
    let result = AnalysisResult::from_value(AnalysisKind::Astrology, value).unwrap();
    let AnalysisResult::Astrology(chart) = result else {
        panic!("expected astrology chart");
    };
    assert_eq!(chart.sun_sign, "金牛座");
    assert!(chart.houses.is_empty());
    assert_eq!(chart.planets.get("月亮").unwrap().house, "第4宫");
}

#[test]
fn test_wrong_shape_is_an_error() {
    assert!(AnalysisResult::from_value(AnalysisKind::Ziwei, testing::bazi_json()).is_err());
}

#[test]
fn test_entries_serialize_in_order() {
    let entries: Entries<u32> = vec![("b".to_string(), 1), ("a".to_string(), 2)].into();
    assert_eq!(serde_json::to_string(&entries).unwrap(), r#"{"b":1,"a":2}"#);
}

#[test]
fn test_history_entry_decodes_payload() {
    let entry: AnalysisHistoryEntry = serde_json::from_value(serde_json::json!({
        "id": 1,
        "birth_info_id": 5,
        "analysis_type": "bazi",
        "analysis_result": testing::bazi_json(),
        "created_at": "2024-06-01T12:00:00"
    }))
    .unwrap();
    assert_eq!(entry.result().unwrap().kind(), AnalysisKind::Bazi);
}
