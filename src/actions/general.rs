use tracing::{debug, error, warn};

use super::{GetLatestInterviewsParams, HomeView, Interview};
use crate::firestore::models::{Direction, FieldOperator};
use crate::firestore::snapshot::QuerySnapshot;
use crate::firestore::FirestoreError;
use crate::TalkBotix;

pub(crate) const INTERVIEWS: &str = "interviews";

/// Documents that do not deserialize as an `Interview` are logged and left
/// out, so one bad record cannot empty a whole list.
fn collect_interviews(snapshot: &QuerySnapshot) -> Vec<Interview> {
    let mut interviews = Vec::with_capacity(snapshot.size());
    for doc in snapshot {
        match doc.data::<Interview>() {
            Ok(Some(interview)) => interviews.push(Interview {
                id: doc.id().to_string(),
                ..interview
            }),
            Ok(None) => {}
            Err(e) => warn!(id = %doc.id(), error = %e, "Skipping malformed interview"),
        }
    }
    interviews
}

impl TalkBotix {
    /// Interviews owned by `user_id`, newest first.
    pub async fn get_interview_by_user_id(&self, user_id: &str) -> Option<Vec<Interview>> {
        let result = async {
            let snapshot = self
                .firestore()
                .collection(INTERVIEWS)
                .query()
                .where_filter("userId", FieldOperator::Equal, user_id)?
                .order_by("createdAt", Direction::Descending)
                .get()
                .await?;
            Ok::<_, FirestoreError>(collect_interviews(&snapshot))
        }
        .await;

        result
            .map_err(|e| error!(user_id, error = %e, "Failed to fetch interviews for user"))
            .ok()
    }

    /// The newest finalised interviews taken by anyone but `user_id`.
    pub async fn get_latest_interviews(
        &self,
        params: GetLatestInterviewsParams,
    ) -> Option<Vec<Interview>> {
        let GetLatestInterviewsParams { user_id, limit } = params;

        let result = async {
            let snapshot = self
                .firestore()
                .collection(INTERVIEWS)
                .query()
                .order_by("createdAt", Direction::Descending)
                .where_filter("finalised", FieldOperator::Equal, true)?
                .where_filter("userId", FieldOperator::NotEqual, &user_id)?
                .limit(limit)
                .get()
                .await?;
            Ok::<_, FirestoreError>(collect_interviews(&snapshot))
        }
        .await;

        result
            .map_err(|e| error!(%user_id, error = %e, "Failed to fetch latest interviews"))
            .ok()
    }

    pub async fn get_interview_details_by_id(&self, id: &str) -> Option<Interview> {
        let snapshot = match self.firestore().collection(INTERVIEWS).doc(id) {
            Ok(doc) => doc
                .get()
                .await
                .map_err(|e| error!(id, error = %e, "Failed to fetch interview"))
                .ok()?,
            Err(e) => {
                debug!(id, error = %e, "Interview lookup with an unusable id");
                return None;
            }
        };

        match snapshot.data::<Interview>() {
            Ok(Some(interview)) => Some(Interview {
                id: id.to_string(),
                ..interview
            }),
            Ok(None) => {
                debug!(id, "Interview not found");
                None
            }
            Err(e) => {
                error!(id, error = %e, "Malformed interview document");
                None
            }
        }
    }

    /// Everything the landing page shows. Signed-out visitors query with an
    /// empty user id, which matches no owned interviews.
    pub async fn home(&self, session_cookie: Option<&str>) -> HomeView {
        let user = self.get_current_user(session_cookie).await;
        let user_id = user.as_ref().map(|u| u.id.as_str()).unwrap_or_default();

        let (user_interviews, latest_interviews) = tokio::join!(
            self.get_interview_by_user_id(user_id),
            self.get_latest_interviews(GetLatestInterviewsParams::new(user_id)),
        );

        HomeView {
            user_interviews: user_interviews.unwrap_or_default(),
            latest_interviews: latest_interviews.unwrap_or_default(),
            user,
        }
    }
}
