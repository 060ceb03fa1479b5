//! Fixtures and an in-process fake backend shared by unit tests.

use std::collections::HashSet;
use std::sync::Mutex;

use chrono::{NaiveDate, NaiveTime};

use crate::api::ClientApi;
use crate::error::{MingliError, Result};
use crate::model::*;

pub fn user(id: i64) -> User {
    User {
        id,
        wechat_openid: format!("mock_user_{id}"),
        nickname: "测试用户".into(),
        avatar_url: None,
    }
}

pub fn record(id: i64, user_id: i64, nickname: &str) -> BirthRecord {
    BirthRecord {
        id,
        user_id,
        nickname: nickname.into(),
        gender: Gender::Male,
        birth_date: NaiveDate::from_ymd_opt(1990, 5, 17).unwrap(),
        birth_time: NaiveTime::from_hms_opt(8, 30, 0).unwrap(),
        birth_place: Some("杭州".into()),
        longitude: None,
        latitude: None,
        created_at: None,
        updated_at: None,
    }
}

pub fn draft(nickname: &str) -> BirthDraft {
    BirthDraft {
        nickname: nickname.into(),
        gender: Gender::Female,
        birth_date: NaiveDate::from_ymd_opt(1992, 11, 3).unwrap(),
        birth_time: NaiveTime::from_hms_opt(21, 15, 0).unwrap(),
        birth_place: None,
        longitude: None,
        latitude: None,
    }
}

pub fn bazi_json() -> serde_json::Value {
    serde_json::json!({
        "bazi": {"year": "庚午", "month": "辛巳", "day": "丙申", "hour": "丙辰"},
        "wuxing": {"金": 2, "木": 1, "水": 2, "火": 1, "土": 2},
        "analysis": {
            "性格特点": "性格坚毅，意志坚定。",
            "事业运势": "事业运势较佳。"
        }
    })
}

pub fn ziwei_json() -> serde_json::Value {
    serde_json::json!({
        "mingpan": {
            "命宫": {"主星": "紫微", "副星": ["天府", "天相"], "位置": "寅宫"},
            "迁移宫": {"主星": "破军", "副星": [], "位置": "申宫"}
        },
        "analysis": {"命格特征": "紫微坐命，天生贵气。"}
    })
}

pub fn astrology_json() -> serde_json::Value {
    serde_json::json!({
        "sun_sign": "金牛座",
        "moon_sign": "巨蟹座",
        "rising_sign": "天秤座",
        "planets": {
            "太阳": {"sign": "金牛座", "house": "第10宫", "degree": "15°"},
            "月亮": {"sign": "巨蟹座", "house": "第4宫", "degree": "22°"}
        },
        "houses": {"第1宫": "自我与个性"},
        "analysis": {"性格特质": "太阳金牛座，性格稳重。"}
    })
}

pub fn result(kind: AnalysisKind) -> AnalysisResult {
    let value = match kind {
        AnalysisKind::Bazi => bazi_json(),
        AnalysisKind::Ziwei => ziwei_json(),
        AnalysisKind::Astrology => astrology_json(),
    };
    AnalysisResult::from_value(kind, value).unwrap()
}

#[derive(Default)]
struct FakeState {
    next_user_id: i64,
    next_record_id: i64,
    records: Vec<BirthRecord>,
    calls: Vec<String>,
    fail_login: bool,
    fail_list: bool,
    fail_mutations: bool,
    failing_kinds: HashSet<AnalysisKind>,
}

/// Backend double holding server truth in memory and logging every call.
pub struct FakeApi {
    state: Mutex<FakeState>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(FakeState {
                next_user_id: 1,
                next_record_id: 100,
                ..Default::default()
            }),
        }
    }

    pub fn with_records(records: Vec<BirthRecord>) -> Self {
        let api = Self::new();
        api.state.lock().unwrap().records = records;
        api
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.calls().iter().filter(|c| c.starts_with(prefix)).count()
    }

    pub fn server_records(&self, user_id: i64) -> Vec<BirthRecord> {
        let state = self.state.lock().unwrap();
        state
            .records
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect()
    }

    pub fn set_fail_login(&self, fail: bool) {
        self.state.lock().unwrap().fail_login = fail;
    }

    pub fn set_fail_list(&self, fail: bool) {
        self.state.lock().unwrap().fail_list = fail;
    }

    pub fn set_fail_mutations(&self, fail: bool) {
        self.state.lock().unwrap().fail_mutations = fail;
    }

    pub fn set_fail_analysis(&self, kind: AnalysisKind, fail: bool) {
        let mut state = self.state.lock().unwrap();
        if fail {
            state.failing_kinds.insert(kind);
        } else {
            state.failing_kinds.remove(&kind);
        }
    }

    fn log(&self, call: String) -> std::sync::MutexGuard<'_, FakeState> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        state
    }
}

fn refused(what: &str) -> MingliError {
    MingliError::Network(format!("{what} returned 500 Internal Server Error"))
}

impl ClientApi for FakeApi {
    async fn create_user(&self, _user: &NewUser) -> Result<CreateUserResponse> {
        let mut state = self.log("create_user".into());
        if state.fail_login {
            return Err(refused("POST /api/users"));
        }
        let id = state.next_user_id;
        state.next_user_id += 1;
        Ok(CreateUserResponse {
            success: true,
            user_id: Some(id),
        })
    }

    async fn get_user(&self, openid: &str) -> Result<User> {
        let _state = self.log(format!("get_user:{openid}"));
        Err(refused("GET /api/users"))
    }

    async fn list_birth_records(&self, user_id: i64) -> Result<Vec<BirthRecord>> {
        let state = self.log(format!("list:{user_id}"));
        if state.fail_list {
            return Err(refused("GET /api/birth-info/user"));
        }
        Ok(state
            .records
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn create_birth_record(&self, user_id: i64, draft: &BirthDraft) -> Result<()> {
        let mut state = self.log(format!("create:{user_id}"));
        if state.fail_mutations {
            return Err(refused("POST /api/birth-info"));
        }
        let id = state.next_record_id;
        state.next_record_id += 1;
        let mut record = record(id, user_id, &draft.nickname);
        record.gender = draft.gender;
        record.birth_date = draft.birth_date;
        record.birth_time = draft.birth_time;
        record.birth_place = draft.birth_place.clone();
        // Newest first, like the reference backend
        state.records.insert(0, record);
        Ok(())
    }

    async fn update_birth_record(&self, id: i64, draft: &BirthDraft) -> Result<()> {
        let mut state = self.log(format!("update:{id}"));
        if state.fail_mutations {
            return Err(refused("PUT /api/birth-info"));
        }
        if let Some(r) = state.records.iter_mut().find(|r| r.id == id) {
            r.nickname = draft.nickname.clone();
            r.gender = draft.gender;
            r.birth_date = draft.birth_date;
            r.birth_time = draft.birth_time;
            r.birth_place = draft.birth_place.clone();
        }
        Ok(())
    }

    async fn delete_birth_record(&self, id: i64) -> Result<()> {
        let mut state = self.log(format!("delete:{id}"));
        if state.fail_mutations {
            return Err(refused("DELETE /api/birth-info"));
        }
        state.records.retain(|r| r.id != id);
        Ok(())
    }

    async fn run_analysis(&self, record_id: i64, kind: AnalysisKind) -> Result<AnalysisResult> {
        let state = self.log(format!("analysis:{record_id}:{kind}"));
        if state.failing_kinds.contains(&kind) {
            return Err(refused("POST /api/analysis"));
        }
        Ok(result(kind))
    }

    async fn analysis_history(&self, record_id: i64) -> Result<Vec<AnalysisHistoryEntry>> {
        let _state = self.log(format!("history:{record_id}"));
        Ok(Vec::new())
    }
}
