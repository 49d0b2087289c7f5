pub mod capital;
pub mod cjk;
pub mod company;
pub mod criteria;
pub mod filter;
pub mod heuristic;
pub mod lexicon;
pub mod scoring;

pub use company::Company;
pub use criteria::{
	CompanyType, Exclusions, MAX_COMPANY_AGE, NumericRange, QueryIntent, RangeOp, SearchCriteria, SortField,
	SortOrder, SortSpec,
};

/// Calendar year used for every age computation in a request.
pub fn current_year() -> i32 {
	time::OffsetDateTime::now_utc().year()
}
