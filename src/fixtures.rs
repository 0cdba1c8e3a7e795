//! Sample data directory shared by service and catalog tests.

use std::fs;
use std::path::Path;

use tempfile::TempDir;

use crate::catalog::Catalog;
use crate::models::{Config, DataConfig};

const LECTURES: &str = "\
lectureId/academyId/subject/year/name/instructor/textbook/lecturePrice/textbookPrice/room/description/grade/rating/currentEnrolled/capacity/dayOfWeek/time/image
L001/대치명인/수학/2025/수학 개념완성/김민수/개념원리/150000/25000/301호/개념 정리/고2, 고3/4.5/10/30/월, 수/18:00~20:00
L002/대치명인/영어/2025/영어 독해 마스터/이영희/리딩파워/120000/20000/202호/독해 집중/고3/4.8/29/30/화/19:00~21:00/eng.png
L005/broken/row
3/시대인재/수학/2025/N수 수학 심화/김민수//180000//401호/심화 문제풀이/N수/4.9/20/20/목/10:00~13:00
X9/시대인재/과학/2025/이름만/최과학//100000//101호/설명/고1/3.0/0/10/금/10:00~12:00
L004/시대인재/국어/2025/국어 문학 정복/박지훈/문학의 힘/130000/18000/105호/문학 작품 분석/고1, 고2/4.2/5/25/토/14:00~16:00/kor.jpg
";

const INSTRUCTORS: &str = "\
id/name/academyId/introduction/subject/textbookIds/lectureIds/studentIds/rating/profileImage
I01/김민수/대치명인/개념부터 심화까지/수학/T1/L001,3/u1/4.7/kim.png
I02/이영희/대치명인/독해의 정석/영어/T9/L002/u1/4.6/lee.png
I03/박지훈/시대인재/문학 전문/국어//L004//4.1/
";

const TEXTBOOKS: &str = "\
id/name/price/subject/lectureId/instructorName
T1/개념원리/25000/수학/L001/김민수
T2/리딩파워/20000/영어/L002/이영희
T3/문학의 힘 (구판)/15000/국어/L004/박지훈
T4/문학의 힘/18000/국어/4/박지훈
";

const REVIEWS: &str = "\
instructorId/lectureId/id/userId/rating/content
I01/L001/R1/u1/5/설명이 명확해요
I01/L003/R2/u3/4/어렵지만 좋아요
I02/L002/R3/u1/4.5/독해 실력이 늘었어요
I02/L002/R4/u2/abc/점수 없음
";

const PAYMENTS: &str = "\
paymentId/userId/lectureId/amount/textbookPurchasedFlag/method/paymentDateTime/status
P1/u1/L001/-150000/N/카드/2025-03-02 14:30:00/완료
P2/u1/L001/-25000/Y/카드/2025-03-02 14:31:00/완료
P3/u2/L004/-130000/N/계좌이체/2025-03-10 09:00:00/완료
P4/u3/3/-180000/N/카드/2025-04-01 10:00:00/완료
P5/u1/L002/-120000/N/카드/2025-04-03 11:00:00/완료
P6/u1/L002/-20000/Y/카드/2025-04-03 11:01:00/완료
u1,pw1,홍길동,Y
";

const USERS: &str = "\
userId/password/name/birthDate/grade/lectureIds/paymentIds
u1/pw1/홍길동/2007-03-01/고3/L002,L001/P1,P2,P5,P6
u2/pw2/김철수/2008-05-05/고2//
u3/pw3/이영희/2005-11-11/N수/3/P4
";

const ENROLLMENTS: &str = "\
enrollmentId/lectureId/status/dayOfWeek/startTime/endTime/room/note
E1/L001/수강중/월/18:00/20:00/별관 2층/월요일만 참석
E2/L002//////
";

/// Write every backing file into `dir`.
pub fn write_data(dir: &Path) {
    let files = [
        ("lectures.txt", LECTURES),
        ("instructors.txt", INSTRUCTORS),
        ("textbooks.txt", TEXTBOOKS),
        ("reviews.txt", REVIEWS),
        ("payments.txt", PAYMENTS),
        ("users.txt", USERS),
        ("enrollments.txt", ENROLLMENTS),
    ];
    for (name, content) in files {
        fs::write(dir.join(name), content).unwrap();
    }
}

/// A catalog opened over a fresh copy of the sample data.
pub fn catalog() -> (TempDir, Catalog) {
    let tmp = TempDir::new().unwrap();
    write_data(tmp.path());
    let config = Config {
        data: DataConfig::in_dir(tmp.path()),
        ..Config::default()
    };
    let catalog = Catalog::open(&config).unwrap();
    (tmp, catalog)
}
