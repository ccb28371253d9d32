use crate::{
    api::security::JwtSecurityService,
    service::{
        meetings::MeetingService, members::MemberService, packages::PackageService, powerteams::PowerTeamService, referrals::ReferralService,
        taxonomy::TaxonomyService,
    },
};

/**
* Represents the application state shared across the Actix web application.
*/
pub struct AppState {
    /**
     * The JWT security service for handling authentication and authorization.
     */
    pub jwt_service: JwtSecurityService,
    /**
     * The service for categories, sub categories and states.
     */
    pub taxonomy_service: TaxonomyService,
    /**
     * The service for chapter members.
     */
    pub member_service: MemberService,
    /**
     * The service for chapter meetings and trainings.
     */
    pub meeting_service: MeetingService,
    /**
     * The service for membership packages.
     */
    pub package_service: PackageService,
    /**
     * The service for power teams.
     */
    pub powerteam_service: PowerTeamService,
    /**
     * The service for references, thank-you slips and requirements.
     */
    pub referral_service: ReferralService,
}

impl AppState {
    /**
     * Creates a new instance of `AppState`.
     */
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        jwt_service: JwtSecurityService,
        taxonomy_service: TaxonomyService,
        member_service: MemberService,
        meeting_service: MeetingService,
        package_service: PackageService,
        powerteam_service: PowerTeamService,
        referral_service: ReferralService,
    ) -> Self {
        AppState { jwt_service, taxonomy_service, member_service, meeting_service, package_service, powerteam_service, referral_service }
    }
}
