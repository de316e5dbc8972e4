pub mod feedback;
pub mod page;
pub mod session;
pub mod site;
pub mod verdict;

pub use feedback::FeedbackRecord;
pub use page::{ClassificationRequest, PageContent, PageMetadata};
pub use session::{Session, SessionStatus};
pub use site::{hostname_of, SiteVisit, VisitedSiteRecord};
pub use verdict::{Verdict, VerdictSource};
