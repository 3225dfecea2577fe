use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::{Date, Time};
use uuid::Uuid;

/// Time span a plan's absolute limits refer to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PeriodLimit {
    Daily,
    Weekly,
    ByMeal,
}

impl FromStr for PeriodLimit {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "DAILY" => PeriodLimit::Daily,
            "WEEKLY" => PeriodLimit::Weekly,
            "BY_MEAL" => PeriodLimit::ByMeal,
            other => anyhow::bail!("unknown period limit {other:?}"),
        })
    }
}

/// Calories/lipids/proteins/carbohydrates quadruple, used both for absolute
/// limits and for percentages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NutrientTargets {
    pub calories: f64,
    pub lipids: f64,
    pub proteins: f64,
    pub carbohydrates: f64,
}

impl NutrientTargets {
    pub fn map(self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            calories: f(self.calories),
            lipids: f(self.lipids),
            proteins: f(self.proteins),
            carbohydrates: f(self.carbohydrates),
        }
    }
}

/// Materialized, dated occurrence of a meal slot within a plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct NutritionalPlanHasMeal {
    pub id: Uuid,
    pub nutritional_plan_id: Uuid,
    pub meals_of_plan_id: Uuid,
    pub meal_date: Date,
}

#[derive(Debug, FromRow)]
pub struct NutritionalPlanRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub calories_limit: f64,
    pub lipids_limit: f64,
    pub proteins_limit: f64,
    pub carbohydrates_limit: f64,
    pub period_limit: String,
    pub active: bool,
    pub valid_until: Date,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NutritionalPlan {
    pub id: Uuid,
    pub user_id: Uuid,
    pub limits: NutrientTargets,
    pub period_limit: PeriodLimit,
    pub active: bool,
    pub valid_until: Date,
    pub scheduled_meals: Vec<NutritionalPlanHasMeal>,
}

impl NutritionalPlan {
    pub fn from_row(r: NutritionalPlanRow, scheduled_meals: Vec<NutritionalPlanHasMeal>) -> anyhow::Result<Self> {
        Ok(Self {
            id: r.id,
            user_id: r.user_id,
            limits: NutrientTargets {
                calories: r.calories_limit,
                lipids: r.lipids_limit,
                proteins: r.proteins_limit,
                carbohydrates: r.carbohydrates_limit,
            },
            period_limit: r.period_limit.parse()?,
            active: r.active,
            valid_until: r.valid_until,
            scheduled_meals,
        })
    }

    pub fn first_meal_date(&self) -> Option<Date> {
        self.scheduled_meals.iter().map(|m| m.meal_date).min()
    }
}

/// A meal-of-plan template of the plan together with its type of meal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct PlanMealType {
    pub meals_of_plan_id: Uuid,
    pub type_of_meal_id: Uuid,
    pub description: String,
    pub start_time: Time,
    pub end_time: Time,
    pub calories_percentage: f64,
    pub lipids_percentage: f64,
    pub proteins_percentage: f64,
    pub carbohydrates_percentage: f64,
}

impl PlanMealType {
    pub fn percentages(&self) -> NutrientTargets {
        NutrientTargets {
            calories: self.calories_percentage,
            lipids: self.lipids_percentage,
            proteins: self.proteins_percentage,
            carbohydrates: self.carbohydrates_percentage,
        }
    }
}
