use serde::{Deserialize, Serialize};

use super::{check_score, deserialize_label};
use crate::extract::Validate;

/// 单道题的参考解答
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseSolution {
    /// 题号（自由格式，不一定连续，如 "1"、"2a"）
    #[serde(deserialize_with = "deserialize_label")]
    pub number: String,
    pub title: String,
    /// 解题步骤
    pub method: String,
    /// 最终结果
    pub result: String,
    pub max_score: f64,
}

/// 参考答案与评分标准
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseSolutionSet {
    pub exercises: Vec<ExerciseSolution>,
    /// 预期等于各题满分之和，但不强制
    pub total_max_score: f64,
}

impl ExerciseSolutionSet {
    /// 各题满分之和
    pub fn summed_max_score(&self) -> f64 {
        self.exercises.iter().map(|e| e.max_score).sum()
    }

    /// 总分是否与各题满分之和一致
    pub fn is_total_consistent(&self) -> bool {
        (self.summed_max_score() - self.total_max_score).abs() < 1e-6
    }
}

impl Validate for ExerciseSolutionSet {
    fn validate(&self) -> Result<(), String> {
        if self.exercises.is_empty() {
            return Err("参考答案中没有任何题目".to_string());
        }
        for exercise in &self.exercises {
            check_score(&format!("第 {} 题的 maxScore", exercise.number), exercise.max_score)?;
        }
        check_score("totalMaxScore", self.total_max_score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::extract_as;

    fn sample() -> ExerciseSolutionSet {
        ExerciseSolutionSet {
            exercises: vec![
                ExerciseSolution {
                    number: "1".to_string(),
                    title: "Equazione di secondo grado".to_string(),
                    method: "Formula risolutiva: $x = \\frac{-b \\pm \\sqrt{\\Delta}}{2a}$".to_string(),
                    result: "x = 2, x = 3".to_string(),
                    max_score: 4.0,
                },
                ExerciseSolution {
                    number: "2b".to_string(),
                    title: "Moto rettilineo".to_string(),
                    method: "v = s / t".to_string(),
                    result: "v = 12 m/s".to_string(),
                    max_score: 6.0,
                },
            ],
            total_max_score: 10.0,
        }
    }

    #[test]
    fn test_round_trip_through_extractor() {
        let set = sample();
        let raw = serde_json::to_string(&set).unwrap();
        let extracted = extract_as::<ExerciseSolutionSet>(&raw).unwrap();
        assert_eq!(extracted.value, set);
        assert!(!extracted.repaired);
    }

    #[test]
    fn test_integer_exercise_number_is_accepted() {
        let raw = r#"{"exercises": [{"number": 1, "title": "t", "method": "m", "result": "r", "maxScore": 10}], "totalMaxScore": 10}"#;
        let set = extract_as::<ExerciseSolutionSet>(raw).unwrap().value;
        assert_eq!(set.exercises[0].number, "1");
        assert!(set.is_total_consistent());
    }

    #[test]
    fn test_float_exercise_number_is_accepted() {
        let raw = r#"{"exercises": [
            {"number": 2.0, "title": "t", "method": "m", "result": "r", "maxScore": 4},
            {"number": 2.5, "title": "t", "method": "m", "result": "r", "maxScore": 6}
        ], "totalMaxScore": 10}"#;
        let set = extract_as::<ExerciseSolutionSet>(raw).unwrap().value;
        assert_eq!(set.exercises[0].number, "2");
        assert_eq!(set.exercises[1].number, "2.5");
    }

    #[test]
    fn test_empty_exercises_rejected() {
        let set = ExerciseSolutionSet {
            exercises: vec![],
            total_max_score: 10.0,
        };
        assert!(set.validate().is_err());
    }

    #[test]
    fn test_negative_max_score_rejected() {
        let mut set = sample();
        set.exercises[1].max_score = -1.0;
        assert!(set.validate().is_err());
    }

    #[test]
    fn test_summed_max_score() {
        let set = sample();
        assert_eq!(set.summed_max_score(), 10.0);
        assert!(set.is_total_consistent());
    }
}
